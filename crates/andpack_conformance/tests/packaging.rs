//! Package contents: native libraries, app bundles with asset packs, and
//! layout code-behind.

use andpack_build::targets::*;
use andpack_build::TargetStatus;
use andpack_conformance::{all_skipped, diagnostic_codes, ran_targets, TestProject};
use tempfile::TempDir;

fn app(root: &TempDir) -> TestProject {
    let app = TestProject::app(root.path(), "App1", "com.example.app1");
    app.strings(&[("app_name", "App1")]);
    app
}

#[test]
fn native_libraries_land_under_their_abi() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config("[build]\nsupported_abis = [\"arm64-v8a\", \"x86_64\"]\n\n[[native_libraries]]\npath = \"libs\"");
    app.write("libs/arm64-v8a/libfoo.so", "arm64");
    app.write("libs/x86_64/libfoo.so", "x86_64");
    app.write("libs/x86/libfoo.so", "x86");

    let report = app.build();
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(&report));
    let entries = app.package_entries();
    assert!(entries.contains(&"lib/arm64-v8a/libfoo.so".to_string()));
    assert!(entries.contains(&"lib/x86_64/libfoo.so".to_string()));
    assert!(!entries.contains(&"lib/x86/libfoo.so".to_string()));
}

#[test]
fn unknown_abi_is_an_error() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config("[[native_libraries]]\npath = \"libs\"");
    app.write("libs/arm64-v8a/libfoo.so", "arm64");
    app.write("libs/mips/libbar.so", "mips");

    let report = app.build();
    assert!(!report.succeeded);
    assert!(diagnostic_codes(&report).contains(&"PKG0001".to_string()));
    assert_eq!(report.status(BUILD_APK), Some(&TargetStatus::Failed));
    assert_eq!(report.status(SIGN), Some(&TargetStatus::Blocked));
}

#[test]
fn duplicate_native_library_warns_once_and_keeps_one_copy() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config(
        "[[native_libraries]]\npath = \"libs\"\n\n[[native_libraries]]\npath = \"extra/libfoo.so\"\nabi = \"arm64-v8a\"",
    );
    app.write("libs/arm64-v8a/libfoo.so", "first");
    app.write("extra/libfoo.so", "second");

    let report = app.build();
    assert!(report.succeeded);
    let codes = diagnostic_codes(&report);
    assert_eq!(codes.iter().filter(|c| *c == "PKG0002").count(), 1);
    let entries = app.package_entries();
    assert_eq!(entries.iter().filter(|e| *e == "lib/arm64-v8a/libfoo.so").count(), 1);

    let again = app.build();
    assert!(all_skipped(&again), "ran: {:?}", ran_targets(&again));
    assert!(again.diagnostics.is_empty());
}

#[test]
fn app_bundle_splits_asset_packs() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config(
        "[build]\npackage_format = \"aab\"\n\n[[assets]]\npath = \"Assets/Levels\"\npack = \"levels\"\ndelivery = \"OnDemand\"",
    );
    app.write("Assets/readme.txt", "base asset");
    app.write("Assets/Levels/level1.dat", "level one");

    let report = app.build();
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(&report));
    assert!(report.ran(CREATE_ASSET_PACK_MANIFESTS));
    assert!(report.ran(BUILD_ASSET_PACKS));
    assert!(report.ran(BUILD_APP_BUNDLE));
    assert!(report.status(BUILD_APK).is_none());

    let package = app.load().package_path();
    assert!(package.ends_with("bin/com.example.app1.aab"));
    let entries = app.package_entries();
    assert!(entries.contains(&"base/manifest/AndroidManifest.xml".to_string()));
    assert!(entries.contains(&"base/assets/readme.txt".to_string()));
    assert!(entries.contains(&"levels/manifest/AndroidManifest.xml".to_string()));
    assert!(entries.contains(&"levels/assets.pb".to_string()));
    assert!(entries.iter().any(|e| e.starts_with("levels/assets/") && e.ends_with("level1.dat")));
    assert!(!entries.iter().any(|e| e.starts_with("base/assets/") && e.ends_with("level1.dat")));

    let manifest = app.read("obj/assetpacks/levels/AndroidManifest.xml");
    assert!(manifest.contains("split=\"levels\""));
    assert!(manifest.contains("<dist:on-demand/>"));
}

#[test]
fn pack_asset_changes_leave_base_assets_alone() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config("[build]\npackage_format = \"aab\"\n\n[[assets]]\npath = \"Assets/Levels\"\npack = \"levels\"");
    app.write("Assets/readme.txt", "base asset");
    app.write("Assets/Levels/level1.dat", "level one");
    app.write("Assets/Levels/level2.dat", "level two");
    assert!(app.build().succeeded);

    app.write("Assets/Levels/level1.dat", "level one, revised");
    let edited = app.build();
    assert!(edited.succeeded);
    assert!(edited.ran(BUILD_ASSET_PACKS));
    assert!(edited.was_skipped(GENERATE_ASSETS_DIR), "ran: {:?}", ran_targets(&edited));

    app.remove("Assets/Levels/level2.dat");
    let removed = app.build();
    assert!(removed.succeeded);
    assert!(removed.ran(BUILD_ASSET_PACKS));
    assert!(removed.ran(BUILD_APP_BUNDLE));
    assert!(removed.was_skipped(GENERATE_ASSETS_DIR), "ran: {:?}", ran_targets(&removed));
    assert!(!app.package_entries().iter().any(|e| e.ends_with("level2.dat")));
}

#[test]
fn apk_folds_asset_packs_into_base() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config("[[assets]]\npath = \"Assets/Levels\"\npack = \"levels\"\ndelivery = \"OnDemand\"");
    app.write("Assets/Levels/level1.dat", "level one");

    let report = app.build();
    assert!(report.succeeded);
    assert!(report.status(BUILD_ASSET_PACKS).is_none());
    let entries = app.package_entries();
    assert!(entries.iter().any(|e| e.starts_with("assets/") && e.ends_with("level1.dat")));
}

#[test]
fn dropped_asset_pack_is_removed() {
    let root = TempDir::new().unwrap();
    let mut app = app(&root);
    app.config("[build]\npackage_format = \"aab\"");
    let base = app.dir().join("andpack.toml");
    let base_config = std::fs::read_to_string(&base).unwrap();
    app.config("[[assets]]\npath = \"Assets/Levels\"\npack = \"levels\"");
    app.write("Assets/Levels/level1.dat", "level one");
    assert!(app.build().succeeded);
    assert!(app.path("obj/assetpacks/levels").is_dir());

    std::fs::write(&base, base_config).unwrap();
    let report = app.build();
    assert!(report.succeeded);
    assert!(report.ran(CREATE_ASSET_PACK_MANIFESTS));
    assert!(!app.path("obj/assetpacks/levels").exists());
    let entries = app.package_entries();
    assert!(!entries.iter().any(|e| e.starts_with("levels/")));
    assert!(entries.iter().any(|e| e.starts_with("base/assets/") && e.ends_with("level1.dat")));
}

#[test]
fn layouts_with_tools_classes_get_bindings() {
    let root = TempDir::new().unwrap();
    let app = app(&root);
    app.write(
        "Resources/layout/Main.xml",
        r#"<?xml version="1.0" encoding="utf-8"?>
<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools"
    tools:classes="App1.MainActivity">
  <Button android:id="@+id/ok" android:text="@string/app_name" />
</LinearLayout>
"#,
    );
    app.write(
        "Resources/layout/Plain.xml",
        r#"<FrameLayout xmlns:android="http://schemas.android.com/apk/res/android" />"#,
    );

    let report = app.build();
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(&report));
    let binding = app.read("obj/generated/Main.g.cs");
    assert!(binding.contains("Android.Widget.Button"));
    assert!(binding.contains("MainActivity"));
    assert!(!app.path("obj/generated/Plain.g.cs").exists());
}
