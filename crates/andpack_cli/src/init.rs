//! `andpack init`: project scaffolding.
//!
//! Creates `<name>/` with an `andpack.toml`, a `Resources/` tree and an
//! empty `Assets/` directory. Applications also get an
//! `AndroidManifest.xml` and a main layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use andpack_config::CONFIG_FILE;

use crate::GlobalArgs;

/// Runs the `andpack init` command. Returns exit code 0 on success.
pub fn run(
    name: &str,
    library: bool,
    package: Option<&str>,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = PathBuf::from(name);
    let project_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("invalid project name '{name}'"))?
        .to_string();
    if dir.exists() {
        return Err(format!("directory '{name}' already exists").into());
    }

    let package = package.map(str::to_string).unwrap_or_else(|| default_package(&project_name));
    let created = scaffold(&dir, &project_name, library, &package)?;
    if !global.quiet {
        let kind = if library { "library" } else { "application" };
        eprintln!("  Creating new {kind} project `{project_name}`");
        for path in created {
            eprintln!("     Created {}", path.display());
        }
    }
    Ok(0)
}

/// `com.example.<name>` with characters Java packages reject replaced.
fn default_package(name: &str) -> String {
    let segment: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let segment = if segment.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{segment}")
    } else {
        segment
    };
    format!("com.example.{segment}")
}

/// Writes the project files. Returns the files created.
fn scaffold(root: &Path, name: &str, library: bool, package: &str) -> io::Result<Vec<PathBuf>> {
    for dir in ["Resources/values", "Assets"] {
        fs::create_dir_all(root.join(dir))?;
    }
    let mut created = Vec::new();
    let mut write = |relative: &str, content: String| -> io::Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        created.push(path);
        Ok(())
    };

    write(CONFIG_FILE, config_text(name, library, package))?;
    write(
        "Resources/values/Strings.xml",
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
  <string name="app_name">{name}</string>
</resources>
"#
        ),
    )?;
    if !library {
        write(
            "AndroidManifest.xml",
            format!(
                r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="{package}" android:versionName="1.0">
  <application android:label="@string/app_name">
  </application>
</manifest>
"#
            ),
        )?;
        write(
            "Resources/layout/Main.xml",
            r#"<?xml version="1.0" encoding="utf-8"?>
<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    android:orientation="vertical"
    android:layout_width="match_parent"
    android:layout_height="match_parent">
  <TextView
      android:id="@+id/title"
      android:layout_width="wrap_content"
      android:layout_height="wrap_content"
      android:text="@string/app_name" />
</LinearLayout>
"#
            .to_string(),
        )?;
    }
    Ok(created)
}

fn config_text(name: &str, library: bool, package: &str) -> String {
    let mut content = format!(
        r#"[project]
name = "{name}"
version = "1.0"
"#
    );
    if library {
        content.push_str("kind = \"library\"\n");
    } else {
        content.push_str(&format!("package = \"{package}\"\n"));
    }
    content.push_str(
        r#"
[build]
package_format = "apk"
supported_abis = ["arm64-v8a", "x86_64"]
"#,
    );
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_package_is_a_valid_java_package() {
        assert_eq!(default_package("App1"), "com.example.app1");
        assert_eq!(default_package("My-App"), "com.example.my_app");
        assert_eq!(default_package("1App"), "com.example._1app");
    }

    #[test]
    fn scaffolded_application_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("App1");
        let created = scaffold(&root, "App1", false, "com.example.app1").unwrap();
        assert!(created.contains(&root.join("Resources/layout/Main.xml")));
        assert!(root.join("Assets").is_dir());

        let config = andpack_config::load_config(&root).unwrap();
        assert_eq!(config.project.name, "App1");
        assert_eq!(config.project.package.as_deref(), Some("com.example.app1"));
    }

    #[test]
    fn scaffolded_library_has_no_manifest_or_package() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Lib1");
        scaffold(&root, "Lib1", true, "com.example.lib1").unwrap();
        assert!(!root.join("AndroidManifest.xml").exists());

        let config = andpack_config::load_config(&root).unwrap();
        assert_eq!(config.project.kind, andpack_config::ProjectKind::Library);
        assert!(config.project.package.is_none());
    }
}
