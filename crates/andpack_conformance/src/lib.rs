//! Conformance test helpers for andpack.
//!
//! [`TestProject`] lays out a project on disk (configuration, manifest,
//! resources, assets, native libraries) and builds it through the same entry
//! points the CLI uses, so integration tests can assert on target statuses,
//! diagnostics and the packaged archives.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use andpack_build::{
    build_project, clean_project, BuildContext, BuildReport, Namespace, Project, ProjectResult, TargetStatus,
    Workspace,
};
use andpack_config::CONFIG_FILE;
use filetime::FileTime;

/// Configuration every helper builds with.
pub const CONFIGURATION: &str = "Debug";

/// A project directory under construction.
pub struct TestProject {
    dir: PathBuf,
    header: String,
    extra: String,
}

impl TestProject {
    /// An application named `name` under `root`, with a minimal
    /// `AndroidManifest.xml`.
    pub fn app(root: &Path, name: &str, package: &str) -> Self {
        let header = format!("[project]\nname = \"{name}\"\npackage = \"{package}\"\n");
        let project = Self::create(root.join(name), header);
        project.write(
            "AndroidManifest.xml",
            format!(
                r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="{package}" android:versionCode="1" android:versionName="1.0">
  <application android:label="{name}">
  </application>
</manifest>
"#
            ),
        );
        project
    }

    /// A library project named `name` under `root`.
    pub fn library(root: &Path, name: &str) -> Self {
        let header = format!("[project]\nname = \"{name}\"\nkind = \"library\"\n");
        Self::create(root.join(name), header)
    }

    fn create(dir: PathBuf, header: String) -> Self {
        std::fs::create_dir_all(&dir).unwrap();
        let project = Self {
            dir,
            header,
            extra: String::new(),
        };
        project.save_config();
        project
    }

    fn save_config(&self) {
        std::fs::write(self.dir.join(CONFIG_FILE), format!("{}\n{}", self.header, self.extra)).unwrap();
    }

    /// Appends TOML to `andpack.toml`.
    pub fn config(&mut self, toml: &str) -> &mut Self {
        self.extra.push_str(toml);
        self.extra.push('\n');
        self.save_config();
        self
    }

    /// Project directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `relative` resolved against the project directory.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.join(relative)
    }

    /// Writes a file relative to the project, creating directories.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Moves a file's modification time forward without touching its bytes.
    pub fn touch(&self, relative: &str) {
        let later = SystemTime::now() + Duration::from_secs(5);
        filetime::set_file_mtime(self.path(relative), FileTime::from_system_time(later)).unwrap();
    }

    /// Renames a file within the project.
    pub fn rename(&self, from: &str, to: &str) {
        let dest = self.path(to);
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::rename(self.path(from), dest).unwrap();
    }

    /// Deletes a file relative to the project.
    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).unwrap();
    }

    /// Reads a file relative to the project as text.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    /// Writes `Resources/values/Strings.xml` holding the given strings.
    pub fn strings(&self, entries: &[(&str, &str)]) -> PathBuf {
        let mut text = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n");
        for (name, value) in entries {
            text.push_str(&format!("  <string name=\"{name}\">{value}</string>\n"));
        }
        text.push_str("</resources>\n");
        self.write("Resources/values/Strings.xml", text)
    }

    /// Loads the project for [`CONFIGURATION`].
    pub fn load(&self) -> Project {
        Project::load(&self.dir, CONFIGURATION).unwrap()
    }

    /// Runs a full build of this project alone.
    pub fn build(&self) -> BuildReport {
        build_project(&self.load(), &BuildContext::default(), Namespace::Full).unwrap()
    }

    /// Runs the design-time pass.
    pub fn build_design_time(&self) -> BuildReport {
        build_project(&self.load(), &BuildContext::default(), Namespace::DesignTime).unwrap()
    }

    /// Builds this project and every project it references.
    pub fn build_workspace(&self) -> Vec<ProjectResult> {
        let workspace = Workspace::load(&self.dir, CONFIGURATION).unwrap();
        workspace.build(&BuildContext::default(), Namespace::Full).unwrap()
    }

    /// Removes full build outputs.
    pub fn clean(&self) {
        clean_project(&self.load(), Namespace::Full).unwrap();
    }

    /// Entry names of the unsigned package.
    pub fn package_entries(&self) -> Vec<String> {
        andpack_package::entry_names(&self.load().package_path()).unwrap()
    }

    /// Bytes of one entry of the unsigned package.
    pub fn package_entry(&self, name: &str) -> Vec<u8> {
        andpack_package::read_archive(&self.load().package_path())
            .unwrap()
            .into_iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, bytes)| bytes)
            .unwrap_or_else(|| panic!("{name} is not in the package"))
    }

    /// Entry names of the library archive.
    pub fn library_entries(&self) -> Vec<String> {
        andpack_package::entry_names(&self.load().library_archive_path()).unwrap()
    }
}

/// Codes of every diagnostic in `report`, in emission order.
pub fn diagnostic_codes(report: &BuildReport) -> Vec<String> {
    report.diagnostics.iter().map(|d| d.code.to_string()).collect()
}

/// Names of the targets that ran.
pub fn ran_targets(report: &BuildReport) -> Vec<&'static str> {
    report
        .targets
        .iter()
        .filter(|t| matches!(t.status, TargetStatus::Built(_) | TargetStatus::Failed))
        .map(|t| t.name)
        .collect()
}

/// Returns `true` if every target was skipped.
pub fn all_skipped(report: &BuildReport) -> bool {
    report.targets.iter().all(|t| t.status == TargetStatus::Skipped)
}

/// The finished report of project `name` in a workspace build.
pub fn report_for<'a>(results: &'a [ProjectResult], name: &str) -> &'a BuildReport {
    let result = results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("project {name} was not part of the build"));
    match &result.outcome {
        andpack_build::ProjectOutcome::Finished(report) => report,
        other => panic!("project {name} did not finish: {other:?}"),
    }
}

/// PNG fixtures for image resources.
pub mod png {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

    /// Fully transparent.
    pub const CLEAR: [u8; 4] = [0, 0, 0, 0];
    /// Opaque black, the only valid 9-patch marker color.
    pub const BLACK: [u8; 4] = [0, 0, 0, 255];
    /// Opaque green.
    pub const GREEN: [u8; 4] = [0, 255, 0, 255];

    /// Encodes an 8-bit RGBA image.
    pub fn encode_rgba(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba(pixel(x, y)));
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    /// A 5x5 9-patch stretching its middle pixel both ways.
    pub fn valid_nine_patch() -> Vec<u8> {
        encode_rgba(5, 5, |x, y| {
            let border = x == 0 || y == 0 || x == 4 || y == 4;
            if !border {
                return [0, 0, 255, 255];
            }
            if (y == 0 || x == 0) && (x == 2 || y == 2) {
                BLACK
            } else {
                CLEAR
            }
        })
    }

    /// A 5x5 image with a green pixel on its top border.
    pub fn invalid_nine_patch() -> Vec<u8> {
        encode_rgba(5, 5, |x, y| if y == 0 && x == 3 { GREEN } else { CLEAR })
    }
}
