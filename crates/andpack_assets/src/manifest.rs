//! Asset pack manifests.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::AssetError;
use crate::partition::AssetPack;

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";
const DIST_NS: &str = "http://schemas.android.com/apk/distribution";

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), AssetError> {
    writer.write_event(event).map_err(|e| AssetError::Serialization {
        reason: e.to_string(),
    })
}

/// Renders the `AndroidManifest.xml` of a named pack:
///
/// ```xml
/// <manifest package="com.example.app" split="assetpack1" ...>
///   <dist:module dist:type="asset-pack">
///     <dist:fusing dist:include="true" />
///     <dist:delivery><dist:on-demand /></dist:delivery>
///   </dist:module>
/// </manifest>
/// ```
pub fn pack_manifest(package: &str, pack: &AssetPack) -> Result<String, AssetError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let manifest = BytesStart::new("manifest").with_attributes([
        ("xmlns:android", ANDROID_NS),
        ("xmlns:dist", DIST_NS),
        ("package", package),
        ("split", pack.name.as_str()),
    ]);
    write(&mut writer, Event::Start(manifest))?;
    write(
        &mut writer,
        Event::Start(BytesStart::new("dist:module").with_attributes([("dist:type", "asset-pack")])),
    )?;
    write(
        &mut writer,
        Event::Empty(BytesStart::new("dist:fusing").with_attributes([("dist:include", "true")])),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("dist:delivery")))?;
    write(&mut writer, Event::Empty(BytesStart::new(pack.delivery.manifest_element())))?;
    write(&mut writer, Event::End(BytesEnd::new("dist:delivery")))?;
    write(&mut writer, Event::End(BytesEnd::new("dist:module")))?;
    write(&mut writer, Event::End(BytesEnd::new("manifest")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| AssetError::Serialization {
        reason: e.to_string(),
    })
}
