//! Asset collection and asset pack partitioning.
//!
//! [`collect_assets`] discovers asset files and applies `[[assets]]`
//! metadata, [`partition`] routes each logical path to the base module or a
//! named pack, and [`materialize_pack`] mirrors a pack into the intermediate
//! directory. Named packs also get a manifest ([`pack_manifest`]) and an
//! `assets.pb` table ([`encode_assets_pb`]) but never resources.

#![warn(missing_docs)]

pub mod error;
pub mod item;
pub mod manifest;
pub mod output;
pub mod partition;
pub mod proto;

pub use error::AssetError;
pub use item::{collect_assets, AssetItem};
pub use manifest::pack_manifest;
pub use output::{materialize_pack, pack_dir, remove_stale_packs, PackReport, ASSET_PACKS_DIR};
pub use partition::{
    check_library_assets, is_valid_pack_name, partition, AssetPack, AssetPartition, BASE_PACK,
};
pub use proto::{decode_assets_pb, encode_assets_pb, ASSETS_PB};
