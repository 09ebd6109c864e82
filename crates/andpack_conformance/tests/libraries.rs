//! Library projects: the `.aar` they produce and what an application
//! referencing them picks up.

use andpack_build::targets::*;
use andpack_build::ProjectOutcome;
use andpack_conformance::{all_skipped, diagnostic_codes, png, ran_targets, report_for, TestProject};
use tempfile::TempDir;

fn library(root: &TempDir) -> TestProject {
    let mut lib = TestProject::library(root.path(), "Library1");
    lib.config("[[native_libraries]]\npath = \"libs\"");
    lib.strings(&[("lib_greeting", "Hello from the library")]);
    lib.write("Assets/lib_notes.txt", "notes");
    lib.write("libs/arm64-v8a/libnative.so", "native");
    lib
}

fn referencing_app(root: &TempDir) -> TestProject {
    let mut app = TestProject::app(root.path(), "App1", "com.example.app1");
    app.config("[[references]]\nproject = \"../Library1\"");
    app.strings(&[("app_name", "App1")]);
    app.write(
        "Resources/layout/Main.xml",
        r#"<TextView xmlns:android="http://schemas.android.com/apk/res/android" android:id="@+id/greeting" android:text="@string/lib_greeting" />"#,
    );
    app
}

#[test]
fn library_builds_an_archive() {
    let root = TempDir::new().unwrap();
    let lib = library(&root);

    let report = lib.build();
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(&report));
    assert!(report.ran(CREATE_LIBRARY_ARCHIVE));
    assert!(report.status(BUILD_APK).is_none());
    assert!(report.status(SIGN).is_none());
    assert!(report.status(COMPILE_TO_DALVIK).is_none());

    let entries = lib.library_entries();
    for expected in ["AndroidManifest.xml", "andpack.json", "R.txt", "assets/lib_notes.txt", "jni/arm64-v8a/libnative.so"] {
        assert!(entries.contains(&expected.to_string()), "missing {expected} in {entries:?}");
    }
    assert!(entries.iter().any(|e| e.starts_with("res/values/")));
    assert!(lib.read("obj/R.txt").contains("int string lib_greeting 0x7f"));
}

#[test]
fn application_consumes_library_outputs() {
    let root = TempDir::new().unwrap();
    library(&root);
    let app = referencing_app(&root);

    let results = app.build_workspace();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.succeeded()));
    let report = report_for(&results, "App1");
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(report));

    assert!(app.read("obj/R.txt").contains("int string lib_greeting 0x7f"));
    let entries = app.package_entries();
    assert!(entries.contains(&"assets/lib_notes.txt".to_string()));
    assert!(entries.contains(&"lib/arm64-v8a/libnative.so".to_string()));
}

#[test]
fn unchanged_workspace_rebuild_skips_both_projects() {
    let root = TempDir::new().unwrap();
    library(&root);
    let app = referencing_app(&root);
    assert!(app.build_workspace().iter().all(|r| r.succeeded()));

    let results = app.build_workspace();
    for name in ["Library1", "App1"] {
        let report = report_for(&results, name);
        assert!(all_skipped(report), "{name} ran: {:?}", ran_targets(report));
    }
}

#[test]
fn library_edit_reaches_the_application() {
    let root = TempDir::new().unwrap();
    let lib = library(&root);
    let app = referencing_app(&root);
    assert!(app.build_workspace().iter().all(|r| r.succeeded()));

    lib.strings(&[("lib_greeting", "Hello again from the library")]);
    let results = app.build_workspace();
    let lib_report = report_for(&results, "Library1");
    assert!(lib_report.ran(CREATE_LIBRARY_ARCHIVE));
    let app_report = report_for(&results, "App1");
    assert!(app_report.succeeded);
    assert!(app_report.ran(RESOLVE_IMPORTS));
    assert!(app_report.ran(GENERATE_RESOURCE_DIR));
}

#[test]
fn nine_patches_from_app_and_library_are_packaged_lower_cased() {
    let root = TempDir::new().unwrap();
    let lib = library(&root);
    lib.write("Resources/drawable/Image2.9.png", png::valid_nine_patch());
    lib.write("Resources/drawable/Shared.9.png", png::valid_nine_patch());
    let app = referencing_app(&root);
    app.write("Resources/drawable/Image1.9.png", png::valid_nine_patch());
    let own = png::encode_rgba(5, 5, |x, y| if x == 0 && y == 1 { png::BLACK } else { png::CLEAR });
    app.write("Resources/drawable/Shared.9.png", &own);

    let results = app.build_workspace();
    let report = report_for(&results, "App1");
    assert!(report.succeeded, "diagnostics: {:?}", diagnostic_codes(report));
    assert!(diagnostic_codes(report).contains(&"APT0007".to_string()));

    let entries = app.package_entries();
    for expected in ["res/drawable/image1.9.png", "res/drawable/image2.9.png", "res/drawable/shared.9.png"] {
        assert!(entries.contains(&expected.to_string()), "missing {expected} in {entries:?}");
    }
    assert!(!entries.iter().any(|e| e.contains("Image")));
    assert_eq!(app.package_entry("res/drawable/shared.9.png"), own);
}

#[test]
fn failed_library_blocks_the_application() {
    let root = TempDir::new().unwrap();
    let lib = library(&root);
    lib.write("Resources/drawable/Frame.9.png", png::invalid_nine_patch());
    let app = referencing_app(&root);

    let results = app.build_workspace();
    let lib_report = report_for(&results, "Library1");
    assert!(!lib_report.succeeded);
    assert!(diagnostic_codes(lib_report).contains(&"APT0009".to_string()));

    let app_result = results.iter().find(|r| r.name == "App1").unwrap();
    assert!(matches!(app_result.outcome, ProjectOutcome::Blocked));
    assert!(!app.load().package_path().exists());
}

#[test]
fn missing_archive_reference_is_reported() {
    let root = TempDir::new().unwrap();
    let mut app = TestProject::app(root.path(), "App1", "com.example.app1");
    app.config("[[references]]\narchive = \"libs/missing.aar\"");

    let report = app.build();
    assert!(!report.succeeded);
    assert!(diagnostic_codes(&report).contains(&"LIB0002".to_string()));
    assert_eq!(report.status(GENERATE_RESOURCE_DIR), Some(&andpack_build::TargetStatus::Blocked));
}
