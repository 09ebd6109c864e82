//! The cache store: skip/run decisions and record persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use andpack_common::fs::write_if_changed;

use crate::error::CacheError;
use crate::hasher::SourceHasher;
use crate::props::{BuildProps, BUILD_PROPS_FILE};
use crate::record::{CacheRecord, FileStamp, TargetInputs, TargetOutcome};

/// Directory holding per-target records inside a namespace.
const STAMPS_DIR: &str = "stamps";

/// Extension of record files.
const RECORD_EXT: &str = "cache";

/// Directory of the design-time namespace inside the intermediate directory.
pub const DESIGN_TIME_DIR: &str = "designtime";

/// Which set of records a store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Records of full builds, rooted at the intermediate directory.
    Full,
    /// Records of design-time builds, rooted at `<intermediate>/designtime`.
    DesignTime,
}

impl Namespace {
    /// Returns the root directory of this namespace.
    pub fn dir(self, intermediate: &Path) -> PathBuf {
        match self {
            Namespace::Full => intermediate.to_path_buf(),
            Namespace::DesignTime => intermediate.join(DESIGN_TIME_DIR),
        }
    }
}

/// Why a target has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
    /// The target has never run in this namespace.
    NoRecord,
    /// The previous run failed.
    PreviousFailed,
    /// A property differs from the recorded one.
    PropertyChanged(String),
    /// An input file is new.
    InputAdded(PathBuf),
    /// An input file's content or timestamp changed.
    InputChanged(PathBuf),
    /// A recorded input file is gone.
    InputRemoved(PathBuf),
    /// A recorded output no longer exists.
    OutputMissing(PathBuf),
}

impl fmt::Display for RunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReason::NoRecord => write!(f, "no previous build record"),
            RunReason::PreviousFailed => write!(f, "previous run failed"),
            RunReason::PropertyChanged(k) => write!(f, "property '{k}' changed"),
            RunReason::InputAdded(p) => write!(f, "input '{}' was added", p.display()),
            RunReason::InputChanged(p) => write!(f, "input '{}' is newer", p.display()),
            RunReason::InputRemoved(p) => write!(f, "input '{}' was removed", p.display()),
            RunReason::OutputMissing(p) => write!(f, "output '{}' does not exist", p.display()),
        }
    }
}

/// Result of [`CacheStore::should_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// All inputs are unchanged and all outputs exist.
    Skip,
    /// The target must run.
    Run(RunReason),
}

impl Decision {
    /// Returns `true` for [`Decision::Skip`].
    pub fn is_skip(&self) -> bool {
        matches!(self, Decision::Skip)
    }
}

/// On-disk store of [`CacheRecord`]s for one project and namespace.
///
/// Stamps computed while deciding are kept in memory so committing the
/// same inputs right after the target ran does not hash them again.
pub struct CacheStore {
    root: PathBuf,
    namespace: Namespace,
    stamps: Mutex<BTreeMap<PathBuf, FileStamp>>,
}

impl CacheStore {
    /// Opens the store for `namespace` under an intermediate directory.
    pub fn open(intermediate: &Path, namespace: Namespace) -> Self {
        Self {
            root: namespace.dir(intermediate),
            namespace,
            stamps: Mutex::new(BTreeMap::new()),
        }
    }

    /// Root directory of this store's namespace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The namespace of this store.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    fn stamps_dir(&self) -> PathBuf {
        self.root.join(STAMPS_DIR)
    }

    /// Returns the path of a target's record file.
    pub fn record_path(&self, target: &str) -> PathBuf {
        self.stamps_dir().join(format!("{target}.{RECORD_EXT}"))
    }

    /// Loads a target's record, `None` if absent or unreadable.
    pub fn load_record(&self, target: &str) -> Option<CacheRecord> {
        let text = std::fs::read_to_string(self.record_path(target)).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Compares `props` with the namespace's stored `build.props`.
    ///
    /// When they differ every record is discarded and the new snapshot is
    /// written. Returns the changed keys (empty on first build or no change).
    pub fn sync_build_props(&self, props: &BuildProps) -> Result<Vec<String>, CacheError> {
        let changed = match BuildProps::load(&self.root) {
            Some(stored) if stored == *props => return Ok(Vec::new()),
            Some(stored) => props.changed_keys(&stored),
            None => Vec::new(),
        };
        if !changed.is_empty() {
            tracing::info!(
                namespace = ?self.namespace,
                keys = %changed.join(", "),
                "build properties changed; discarding incremental state"
            );
        }
        self.invalidate_all()?;
        std::fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        props.save(&self.root)?;
        Ok(changed)
    }

    /// Decides whether `target` must run for the given inputs.
    pub fn should_run(&self, target: &str, inputs: &TargetInputs) -> Result<Decision, CacheError> {
        let Some(record) = self.load_record(target) else {
            self.stamp(inputs, &BTreeMap::new());
            return Ok(Decision::Run(RunReason::NoRecord));
        };
        let current = self.stamp(inputs, &record.inputs);
        if record.outcome == TargetOutcome::Failed {
            return Ok(Decision::Run(RunReason::PreviousFailed));
        }
        if let Some(key) = first_property_change(&inputs.properties, &record.properties) {
            return Ok(Decision::Run(RunReason::PropertyChanged(key)));
        }
        let changes = SourceHasher::detect_changes(&current, &record.inputs);
        if let Some(path) = changes.new_files.first() {
            return Ok(Decision::Run(RunReason::InputAdded(path.clone())));
        }
        if let Some(path) = changes.modified_files.first() {
            return Ok(Decision::Run(RunReason::InputChanged(path.clone())));
        }
        if let Some(path) = changes.deleted_files.first() {
            return Ok(Decision::Run(RunReason::InputRemoved(path.clone())));
        }
        if let Some(missing) = record.outputs.iter().find(|p| !p.exists()) {
            return Ok(Decision::Run(RunReason::OutputMissing(missing.clone())));
        }
        Ok(Decision::Skip)
    }

    /// Records a successful run of `target`.
    pub fn commit(
        &self,
        target: &str,
        inputs: &TargetInputs,
        outputs: &[PathBuf],
    ) -> Result<(), CacheError> {
        self.write_record(target, inputs, outputs, TargetOutcome::Succeeded)
    }

    /// Records a failed run of `target` so that it runs again next time.
    pub fn commit_failed(&self, target: &str, inputs: &TargetInputs) -> Result<(), CacheError> {
        self.write_record(target, inputs, &[], TargetOutcome::Failed)
    }

    fn write_record(
        &self,
        target: &str,
        inputs: &TargetInputs,
        outputs: &[PathBuf],
        outcome: TargetOutcome,
    ) -> Result<(), CacheError> {
        let known = self.known_stamps();
        let stamps = SourceHasher::stamp_files(&inputs.files, &known);
        let mut outputs = outputs.to_vec();
        outputs.sort();
        outputs.dedup();
        let record = CacheRecord {
            target: target.to_string(),
            inputs: stamps,
            properties: inputs.properties.clone(),
            outputs,
            outcome,
        };
        let json = serde_json::to_string_pretty(&record).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let path = self.record_path(target);
        write_if_changed(&path, json.as_bytes()).map_err(|e| CacheError::io(&path, e))?;
        Ok(())
    }

    /// Deletes one target's record.
    pub fn invalidate(&self, target: &str) -> Result<(), CacheError> {
        let path = self.record_path(target);
        andpack_common::fs::remove_file_forced(&path).map_err(|e| CacheError::io(&path, e))
    }

    /// Deletes every record in the namespace.
    pub fn invalidate_all(&self) -> Result<(), CacheError> {
        let dir = self.stamps_dir();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Removes the namespace's records and `build.props`.
    ///
    /// For the design-time namespace the whole `designtime/` directory goes,
    /// leaving full-build state untouched.
    pub fn clean(&self) -> Result<(), CacheError> {
        match self.namespace {
            Namespace::DesignTime => {
                if self.root.exists() {
                    std::fs::remove_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
                }
                Ok(())
            }
            Namespace::Full => {
                self.invalidate_all()?;
                let props = self.root.join(BUILD_PROPS_FILE);
                andpack_common::fs::remove_file_forced(&props).map_err(|e| CacheError::io(&props, e))
            }
        }
    }

    fn known_stamps(&self) -> BTreeMap<PathBuf, FileStamp> {
        self.stamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stamp(
        &self,
        inputs: &TargetInputs,
        recorded: &BTreeMap<PathBuf, FileStamp>,
    ) -> BTreeMap<PathBuf, FileStamp> {
        let mut previous = self.known_stamps();
        for (path, stamp) in recorded {
            previous.entry(path.clone()).or_insert(*stamp);
        }
        let current = SourceHasher::stamp_files(&inputs.files, &previous);
        let mut cache = self.stamps.lock().unwrap_or_else(PoisonError::into_inner);
        for (path, stamp) in &current {
            cache.insert(path.clone(), *stamp);
        }
        current
    }
}

fn first_property_change(
    current: &BTreeMap<String, String>,
    recorded: &BTreeMap<String, String>,
) -> Option<String> {
    current
        .iter()
        .find(|(k, v)| recorded.get(*k) != Some(v))
        .map(|(k, _)| k.clone())
        .or_else(|| recorded.keys().find(|k| !current.contains_key(*k)).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn touch(path: &Path) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
        store: CacheStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Strings.xml");
        let output = dir.path().join("out.xml");
        std::fs::write(&input, "<resources/>").unwrap();
        std::fs::write(&output, "out").unwrap();
        let store = CacheStore::open(&dir.path().join("obj"), Namespace::Full);
        Fixture {
            _dir: dir,
            input,
            output,
            store,
        }
    }

    #[test]
    fn first_run_has_no_record() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        assert_eq!(
            f.store.should_run("_Sign", &inputs).unwrap(),
            Decision::Run(RunReason::NoRecord)
        );
    }

    #[test]
    fn commit_then_skip() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.should_run("_Sign", &inputs).unwrap();
        f.store.commit("_Sign", &inputs, &[f.output.clone()]).unwrap();
        assert!(f.store.should_run("_Sign", &inputs).unwrap().is_skip());
    }

    #[test]
    fn second_process_sees_same_decision() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit("_Sign", &inputs, &[f.output.clone()]).unwrap();
        let reopened = CacheStore::open(f.store.root(), Namespace::Full);
        assert!(reopened.should_run("_Sign", &inputs).unwrap().is_skip());
    }

    #[test]
    fn content_change_runs() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit("_Sign", &inputs, &[]).unwrap();
        std::fs::write(&f.input, "<resources><string name=\"a\">b</string></resources>").unwrap();
        touch(&f.input);
        assert_eq!(
            f.store.should_run("_Sign", &inputs).unwrap(),
            Decision::Run(RunReason::InputChanged(f.input.clone()))
        );
    }

    #[test]
    fn touch_runs() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit("_Sign", &inputs, &[]).unwrap();
        touch(&f.input);
        assert!(!f.store.should_run("_Sign", &inputs).unwrap().is_skip());
    }

    #[test]
    fn property_change_runs() {
        let f = fixture();
        let inputs = TargetInputs::new().property("abis", "arm64-v8a");
        f.store.commit("_BuildApk", &inputs, &[]).unwrap();
        let changed = TargetInputs::new().property("abis", "x86");
        assert_eq!(
            f.store.should_run("_BuildApk", &changed).unwrap(),
            Decision::Run(RunReason::PropertyChanged("abis".to_string()))
        );
    }

    #[test]
    fn removed_and_added_inputs_run() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit("t", &inputs, &[]).unwrap();

        let extra = f.input.with_file_name("More.xml");
        std::fs::write(&extra, "x").unwrap();
        let more = TargetInputs::new().file(&f.input).file(&extra);
        assert_eq!(
            f.store.should_run("t", &more).unwrap(),
            Decision::Run(RunReason::InputAdded(extra.clone()))
        );

        std::fs::remove_file(&f.input).unwrap();
        assert_eq!(
            f.store.should_run("t", &inputs).unwrap(),
            Decision::Run(RunReason::InputRemoved(f.input.clone()))
        );
    }

    #[test]
    fn missing_output_runs() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit("t", &inputs, &[f.output.clone()]).unwrap();
        std::fs::remove_file(&f.output).unwrap();
        assert_eq!(
            f.store.should_run("t", &inputs).unwrap(),
            Decision::Run(RunReason::OutputMissing(f.output.clone()))
        );
    }

    #[test]
    fn failed_run_reruns() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        f.store.commit_failed("t", &inputs).unwrap();
        assert_eq!(
            f.store.should_run("t", &inputs).unwrap(),
            Decision::Run(RunReason::PreviousFailed)
        );
    }

    #[test]
    fn build_props_change_discards_records() {
        let f = fixture();
        let inputs = TargetInputs::new().file(&f.input);
        let debug = BuildProps::new().with("configuration", "Debug");
        assert!(f.store.sync_build_props(&debug).unwrap().is_empty());
        f.store.commit("t", &inputs, &[]).unwrap();
        assert!(f.store.sync_build_props(&debug).unwrap().is_empty());
        assert!(f.store.load_record("t").is_some());

        let release = BuildProps::new().with("configuration", "Release");
        assert_eq!(
            f.store.sync_build_props(&release).unwrap(),
            vec!["configuration".to_string()]
        );
        assert!(f.store.load_record("t").is_none());
    }

    #[test]
    fn design_time_namespace_is_separate() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("obj");
        let input = dir.path().join("a.xml");
        std::fs::write(&input, "a").unwrap();
        let inputs = TargetInputs::new().file(&input);

        let full = CacheStore::open(&obj, Namespace::Full);
        let design = CacheStore::open(&obj, Namespace::DesignTime);
        full.commit("_UpdateAndroidResgen", &inputs, &[]).unwrap();
        design.commit("_UpdateAndroidResgen", &inputs, &[]).unwrap();
        assert!(design.record_path("x").starts_with(obj.join("designtime")));

        design.clean().unwrap();
        assert!(!obj.join("designtime").exists());
        assert!(full.load_record("_UpdateAndroidResgen").is_some());
    }

    #[test]
    fn corrupt_record_is_a_miss() {
        let f = fixture();
        let path = f.store.record_path("t");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{{ not json").unwrap();
        assert_eq!(
            f.store.should_run("t", &TargetInputs::new()).unwrap(),
            Decision::Run(RunReason::NoRecord)
        );
    }

    #[test]
    fn invalidate_removes_record() {
        let f = fixture();
        f.store.commit("t", &TargetInputs::new(), &[]).unwrap();
        f.store.invalidate("t").unwrap();
        assert!(f.store.load_record("t").is_none());
    }
}
