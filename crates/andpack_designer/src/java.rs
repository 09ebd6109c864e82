//! `R.java` for the JVM side of the build.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::DesignerModel;

/// `<src_dir>/<package as directories>/R.java`.
pub fn r_java_path(src_dir: &Path, package: &str) -> PathBuf {
    package
        .split('.')
        .filter(|s| !s.is_empty())
        .fold(src_dir.to_path_buf(), |dir, segment| dir.join(segment))
        .join("R.java")
}

/// Renders `R.java` for `package`. Field names are the resource compiler's,
/// not the designer's display names.
pub fn generate_r_java(package: &str, model: &DesignerModel) -> String {
    let mut out = String::new();
    out.push_str("/* AUTO-GENERATED FILE. DO NOT MODIFY. */\n");
    let _ = writeln!(out, "package {package};\n");
    out.push_str("public final class R {\n");
    for (kind, symbols) in model.kinds() {
        let _ = writeln!(out, "    public static final class {kind} {{");
        for symbol in symbols {
            let _ = writeln!(out, "        public static final int {}=0x{:08x};", symbol.name, symbol.id);
        }
        out.push_str("    }\n");
    }
    if !model.styleables().is_empty() {
        out.push_str("    public static final class styleable {\n");
        for styleable in model.styleables() {
            let ids: Vec<String> = styleable.attrs.iter().map(|(_, id)| format!("0x{id:08x}")).collect();
            let _ = writeln!(
                out,
                "        public static final int[] {}={{ {} }};",
                styleable.name,
                ids.join(", ")
            );
            for (field, index) in styleable.index_fields() {
                let _ = writeln!(out, "        public static final int {field}={index};");
            }
        }
        out.push_str("    }\n");
    }
    out.push_str("}\n");
    out
}
