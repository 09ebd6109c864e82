//! Resource kinds known to the designer.

/// Every kind that receives ids, in id-assignment order.
pub const DESIGNER_KINDS: [&str; 24] = [
    "anim",
    "animator",
    "array",
    "attr",
    "bool",
    "color",
    "dimen",
    "drawable",
    "font",
    "fraction",
    "id",
    "integer",
    "interpolator",
    "layout",
    "menu",
    "mipmap",
    "navigation",
    "plurals",
    "raw",
    "string",
    "style",
    "styleable",
    "transition",
    "xml",
];

/// Returns `true` if symbols of `kind` are emitted.
pub fn is_designer_kind(kind: &str) -> bool {
    DESIGNER_KINDS.contains(&kind)
}

/// Name of the nested designer class for a kind: `anim` → `Animation`,
/// `attr` → `Attribute`, `bool` → `Boolean`, `dimen` → `Dimension`, and the
/// capitalised kind otherwise.
pub fn nested_type_name(kind: &str) -> String {
    match kind {
        "anim" => "Animation".to_string(),
        "attr" => "Attribute".to_string(),
        "bool" => "Boolean".to_string(),
        "dimen" => "Dimension".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// Maps a values element kind to the kind its symbol is emitted under.
pub fn symbol_kind(kind: &str) -> &str {
    match kind {
        "string-array" | "integer-array" => "array",
        "enum" | "flag" => "id",
        other => other,
    }
}
