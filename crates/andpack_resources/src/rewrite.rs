//! XML rewriting applied while materialising resources.
//!
//! Two edits are made, both by streaming the document through quick-xml so
//! that untouched markup is written back byte for byte:
//!
//! - file references (`@drawable/Icon`) are lower-cased to match the
//!   lower-cased file names;
//! - managed custom view types (`<App1.Views.MyButton>`, `<fragment
//!   class=..>`, `app:layout_behavior`) are replaced by their generated Java
//!   wrapper names, `x<hash>.MyButton`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use andpack_common::stable_hash64;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use regex::Regex;

use crate::values::XmlError;

/// Java package used for the wrappers of types in a managed namespace.
///
/// Stable across builds; changes only when the namespace does.
pub fn hashed_package(namespace: &str) -> String {
    format!("x{:016x}", stable_hash64(namespace))
}

/// Managed custom view types and their Java wrapper names.
#[derive(Debug, Clone, Default)]
pub struct CustomViewMap {
    names: BTreeMap<String, String>,
}

impl CustomViewMap {
    /// Builds the map from fully qualified managed type names.
    ///
    /// Each type is reachable both by its exact name and with the namespace
    /// lower-cased (`app1.views.MyButton`), as layouts may use either.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = BTreeMap::new();
        for ty in types {
            let ty = ty.as_ref();
            let Some((ns, name)) = ty.rsplit_once('.') else {
                continue;
            };
            let java = format!("{}.{}", hashed_package(ns), name);
            names.insert(format!("{}.{}", ns.to_lowercase(), name), java.clone());
            names.insert(ty.to_string(), java);
        }
        Self { names }
    }

    /// Returns the Java name for a managed type.
    pub fn java_name(&self, managed: &str) -> Option<&str> {
        self.names.get(managed).map(String::as_str)
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What [`rewrite_xml`] changes.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRules<'a> {
    /// Lower-case file-based resource references.
    pub lowercase_references: bool,
    /// Custom views to replace.
    pub custom_views: &'a CustomViewMap,
}

fn file_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(@(?:[A-Za-z0-9_.]+:)?(?:anim|animator|color|drawable|font|layout|menu|mipmap|navigation|raw|transition|xml)/)([A-Za-z0-9_.]+)",
        )
        .expect("valid regex")
    })
}

impl RewriteRules<'_> {
    fn rewrite_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !self.lowercase_references || !text.contains('@') {
            return Cow::Borrowed(text);
        }
        file_reference_regex().replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], caps[2].to_lowercase())
        })
    }

    /// Attributes whose whole value names a managed type.
    fn is_type_attribute(element: &str, key: &str) -> bool {
        let local = key.rsplit(':').next().unwrap_or(key);
        match local {
            "layout_behavior" => true,
            "class" => !key.contains(':') && matches!(element, "fragment" | "view"),
            "name" => key.contains(':') && element == "fragment",
            _ => false,
        }
    }

    fn rewrite_start(
        &self,
        start: &BytesStart<'_>,
        offset: usize,
        text: &str,
    ) -> Result<Option<BytesStart<'static>>, XmlError> {
        let name = utf8(start.name().into_inner(), offset, text)?;
        let new_name = self.custom_views.java_name(name);
        let local = name.rsplit(':').next().unwrap_or(name);
        let mut changed = new_name.is_some();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| xml_error(e.to_string(), offset, text))?;
            let key = utf8(attr.key.as_ref(), offset, text)?.to_string();
            let value = utf8(&attr.value, offset, text)?;
            let new_value = match self.custom_views.java_name(value) {
                Some(java) if Self::is_type_attribute(local, &key) => Cow::Borrowed(java),
                _ => self.rewrite_text(value),
            };
            if new_value != value {
                changed = true;
            }
            attrs.push((key, new_value.into_owned()));
        }
        if !changed {
            return Ok(None);
        }
        let mut out = BytesStart::new(new_name.unwrap_or(name).to_string());
        for (key, value) in &attrs {
            out.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: Cow::Borrowed(value.as_bytes()),
            });
        }
        Ok(Some(out))
    }
}

fn utf8<'b>(bytes: &'b [u8], offset: usize, text: &str) -> Result<&'b str, XmlError> {
    std::str::from_utf8(bytes).map_err(|e| xml_error(e.to_string(), offset, text))
}

/// Converts a byte offset into a 1-based line/column error.
pub(crate) fn xml_error(message: String, offset: usize, text: &str) -> XmlError {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() as u32 + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) as u32 + 1;
    XmlError {
        message,
        line,
        column,
    }
}

/// Rewrites a resource XML document.
///
/// Returns `None` when nothing changed, in which case the source bytes should
/// be copied unmodified.
pub fn rewrite_xml(text: &str, rules: &RewriteRules<'_>) -> Result<Option<String>, XmlError> {
    if !rules.lowercase_references && rules.custom_views.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(text.len()));
    let mut changed = false;
    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| xml_error(e.to_string(), reader.error_position() as usize, text))?;
        let event = match event {
            Event::Eof => break,
            Event::Start(start) => match rules.rewrite_start(&start, offset, text)? {
                Some(new) => {
                    changed = true;
                    Event::Start(new)
                }
                None => Event::Start(start),
            },
            Event::Empty(start) => match rules.rewrite_start(&start, offset, text)? {
                Some(new) => {
                    changed = true;
                    Event::Empty(new)
                }
                None => Event::Empty(start),
            },
            Event::End(end) => {
                let name = utf8(end.name().into_inner(), offset, text)?;
                match rules.custom_views.java_name(name) {
                    Some(java) => {
                        changed = true;
                        Event::End(BytesEnd::new(java.to_string()))
                    }
                    None => Event::End(end),
                }
            }
            Event::Text(raw) => {
                let rewritten = match rules.rewrite_text(utf8(&raw, offset, text)?) {
                    Cow::Owned(new) => Some(new),
                    Cow::Borrowed(_) => None,
                };
                match rewritten {
                    Some(new) => {
                        changed = true;
                        Event::Text(BytesText::from_escaped(new))
                    }
                    None => Event::Text(raw),
                }
            }
            other => other,
        };
        writer
            .write_event(event)
            .map_err(|e| xml_error(e.to_string(), offset, text))?;
    }
    if !changed {
        return Ok(None);
    }
    String::from_utf8(writer.into_inner())
        .map(Some)
        .map_err(|e| xml_error(e.to_string(), 0, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(map: &CustomViewMap) -> RewriteRules<'_> {
        RewriteRules {
            lowercase_references: true,
            custom_views: map,
        }
    }

    #[test]
    fn hashed_package_is_stable_and_distinct() {
        let a = hashed_package("App1.Views");
        assert_eq!(a, hashed_package("App1.Views"));
        assert_ne!(a, hashed_package("App1.Widgets"));
        assert_eq!(a.len(), 17);
        assert!(a.starts_with('x'));
    }

    #[test]
    fn lowercases_file_references() {
        let map = CustomViewMap::default();
        let src = r#"<ImageView xmlns:android="http://schemas.android.com/apk/res/android" android:src="@drawable/UPPER_image" android:text="@string/Hello" />"#;
        let out = rewrite_xml(src, &rules(&map)).unwrap().unwrap();
        assert!(out.contains(r#"android:src="@drawable/upper_image""#));
        assert!(out.contains(r#"android:text="@string/Hello""#));
    }

    #[test]
    fn unchanged_document_is_none() {
        let map = CustomViewMap::default();
        let src = r#"<LinearLayout><TextView android:text="@string/hello"/></LinearLayout>"#;
        assert_eq!(rewrite_xml(src, &rules(&map)).unwrap(), None);
    }

    #[test]
    fn rewrites_custom_views() {
        let map = CustomViewMap::new(["App1.Views.MyButton", "App1.MyFragment"]);
        let src = r#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android" xmlns:app="http://schemas.android.com/apk/res-auto">
  <App1.Views.MyButton android:id="@+id/button1"></App1.Views.MyButton>
  <app1.views.MyButton android:id="@+id/button2"/>
  <fragment class="App1.MyFragment" />
  <fragment android:name="App1.MyFragment" />
  <View app:layout_behavior="App1.MyFragment" />
</LinearLayout>"#;
        let out = rewrite_xml(src, &rules(&map)).unwrap().unwrap();
        let button = format!("{}.MyButton", hashed_package("App1.Views"));
        let fragment = format!("{}.MyFragment", hashed_package("App1"));
        assert!(out.contains(&format!("<{button} android:id=\"@+id/button1\"></{button}>")));
        assert!(out.contains(&format!("<{button} android:id=\"@+id/button2\"/>")));
        assert!(out.contains(&format!("<fragment class=\"{fragment}\"/>")));
        assert!(out.contains(&format!("<fragment android:name=\"{fragment}\"/>")));
        assert!(out.contains(&format!("app:layout_behavior=\"{fragment}\"")));
        assert!(!out.contains("App1.Views.MyButton"));
    }

    #[test]
    fn text_references_in_values() {
        let map = CustomViewMap::default();
        let src = "<resources><item name=\"a\" type=\"drawable\">@drawable/Icon</item></resources>";
        let out = rewrite_xml(src, &rules(&map)).unwrap().unwrap();
        assert!(out.contains(">@drawable/icon</item>"));
    }

    #[test]
    fn malformed_xml_is_error_with_line() {
        let map = CustomViewMap::default();
        let err = rewrite_xml("<a>\n<b @drawable/X></a>", &rules(&map)).unwrap_err();
        assert_eq!(err.line, 2);
    }
}
