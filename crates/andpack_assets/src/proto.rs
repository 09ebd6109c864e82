//! The `assets.pb` table of contents written next to a pack's assets.
//!
//! This is the bundle tool's `Assets` message: a repeated
//! `TargetedAssetsDirectory { string path = 1; }` in field 1, one per
//! directory holding assets. Targeting is never set.

use std::collections::BTreeSet;

use crate::partition::AssetPack;

/// File name of the table inside a pack.
pub const ASSETS_PB: &str = "assets.pb";

const FIELD_ONE_LEN: u8 = (1 << 3) | 2;

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = *bytes.get(*pos)?;
        *pos += 1;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

fn write_len_field(buf: &mut Vec<u8>, payload: &[u8]) {
    buf.push(FIELD_ONE_LEN);
    write_varint(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

/// Directories (`assets`, `assets/sub`, ...) that directly hold a file of
/// the pack, sorted.
pub fn asset_directories(pack: &AssetPack) -> BTreeSet<String> {
    pack.assets
        .keys()
        .map(|logical| match logical.as_str().rsplit_once('/') {
            Some((dir, _)) => format!("assets/{dir}"),
            None => "assets".to_string(),
        })
        .collect()
}

/// Encodes the table for `pack`.
pub fn encode_assets_pb(pack: &AssetPack) -> Vec<u8> {
    let mut out = Vec::new();
    for dir in asset_directories(pack) {
        let mut directory = Vec::new();
        write_len_field(&mut directory, dir.as_bytes());
        write_len_field(&mut out, &directory);
    }
    out
}

/// Decodes the directory paths of a table. Unknown fields are skipped;
/// malformed input yields `None`.
pub fn decode_assets_pb(bytes: &[u8]) -> Option<Vec<String>> {
    let mut dirs = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (field, payload) = read_field(bytes, &mut pos)?;
        if field != 1 {
            continue;
        }
        let mut inner = 0;
        while inner < payload.len() {
            let (field, value) = read_field(payload, &mut inner)?;
            if field == 1 {
                dirs.push(String::from_utf8(value.to_vec()).ok()?);
            }
        }
    }
    Some(dirs)
}

fn read_field<'a>(bytes: &'a [u8], pos: &mut usize) -> Option<(u64, &'a [u8])> {
    let key = read_varint(bytes, pos)?;
    if key & 7 != 2 {
        return None;
    }
    let len = usize::try_from(read_varint(bytes, pos)?).ok()?;
    let end = pos.checked_add(len)?;
    let payload = bytes.get(*pos..end)?;
    *pos = end;
    Some((key >> 3, payload))
}
