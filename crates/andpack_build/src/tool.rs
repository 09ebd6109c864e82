//! Running external tools and turning their output into diagnostics.
//!
//! Tools run in the project directory with `JAVA_TOOL_OPTIONS` forwarded.
//! Output lines shaped like `file:line:col: error CODE: message` (or the
//! `file(line,col)` form) become diagnostics; paths that point into the
//! intermediate `res/` are mapped back to the file the user edits.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use andpack_diagnostics::{codes, Diagnostic, DiagnosticCode, DiagnosticSink, Location, Severity};
use andpack_resources::MergedResourceTree;
use regex::Regex;

use crate::context::{BuildContext, JAVA_TOOL_OPTIONS};

/// A configured tool command.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Short name used in messages (`javac`, `d8`, ...).
    pub label: &'static str,
    /// Command line from `[tools]`; the first word is the program.
    pub command: String,
    /// Code of the error emitted when the tool fails without saying why.
    pub failure: DiagnosticCode,
}

/// Intermediate file → original source.
#[derive(Debug, Clone, Default)]
pub struct SourceMap(BTreeMap<PathBuf, PathBuf>);

impl SourceMap {
    /// Maps every materialised resource under `res_dir` to its winning item.
    pub fn from_tree(tree: &MergedResourceTree, res_dir: &Path) -> Self {
        Self(
            tree.iter()
                .map(|e| (e.output.to_path(res_dir), e.item.source.clone()))
                .collect(),
        )
    }

    /// The original of `path`, or `path` itself.
    pub fn original<'a>(&'a self, path: &'a Path) -> &'a Path {
        self.0.get(path).map(PathBuf::as_path).unwrap_or(path)
    }
}

struct ToolLine<'a> {
    file: &'a str,
    line: Option<u32>,
    column: Option<u32>,
    severity: Severity,
    code: Option<&'a str>,
    message: &'a str,
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<file>[^:(]+(?::\\[^:(]+)?)(?::(?P<line>\d+)(?::(?P<col>\d+))?|\((?P<pline>\d+),(?P<pcol>\d+)\))?: (?P<sev>error|warning)(?: (?P<code>[A-Za-z]+\d+))?: (?P<msg>.*)$",
        )
        .expect("valid regex")
    })
}

fn parse_line(text: &str) -> Option<ToolLine<'_>> {
    let caps = line_pattern().captures(text.trim_end())?;
    let number = |a: &str, b: &str| {
        caps.name(a)
            .or_else(|| caps.name(b))
            .and_then(|m| m.as_str().parse().ok())
    };
    Some(ToolLine {
        file: caps.name("file")?.as_str().trim(),
        line: number("line", "pline"),
        column: number("col", "pcol"),
        severity: if &caps["sev"] == "error" {
            Severity::Error
        } else {
            Severity::Warning
        },
        code: caps.name("code").map(|m| m.as_str()),
        message: caps.name("msg")?.as_str(),
    })
}

/// Runs tools for one project.
pub struct ToolRunner<'a> {
    context: &'a BuildContext,
    project: &'a str,
    working_dir: &'a Path,
    sink: &'a DiagnosticSink,
}

impl<'a> ToolRunner<'a> {
    /// A runner whose tools start in `working_dir`.
    pub fn new(context: &'a BuildContext, project: &'a str, working_dir: &'a Path, sink: &'a DiagnosticSink) -> Self {
        Self {
            context,
            project,
            working_dir,
            sink,
        }
    }

    /// Runs `tool` with `args`. Returns `true` when it exited successfully.
    ///
    /// A tool that cannot be started is BLD0002; one that fails without
    /// printing an error of its own gets the command's failure code.
    pub fn run(&self, tool: &ToolCommand, args: &[OsString], sources: &SourceMap) -> bool {
        let mut words = tool.command.split_whitespace();
        let Some(program) = words.next() else {
            self.sink.emit(
                Diagnostic::error(codes::TOOL_MISSING, format!("No command is configured for {}", tool.label))
                    .for_project(self.project),
            );
            return false;
        };
        let program = self.context.tool_path(program);
        let mut cmd = Command::new(&program);
        cmd.args(words).args(args).current_dir(self.working_dir);
        if let Some(options) = &self.context.java_tool_options {
            cmd.env(JAVA_TOOL_OPTIONS, options);
        }
        tracing::debug!(tool = tool.label, program = %program.display(), args = args.len(), "running tool");

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) => {
                self.sink.emit(
                    Diagnostic::error(
                        codes::TOOL_MISSING,
                        format!("Could not run {} ({}): {err}", tool.label, program.display()),
                    )
                    .for_project(self.project),
                );
                return false;
            }
        };

        let mut reported_error = false;
        let text = [output.stdout.as_slice(), output.stderr.as_slice()]
            .map(String::from_utf8_lossy)
            .join("\n");
        for line in text.lines() {
            match parse_line(line) {
                Some(parsed) => {
                    reported_error |= parsed.severity.is_error();
                    self.sink.emit(self.diagnostic(&parsed, sources));
                }
                None if !line.trim().is_empty() => tracing::debug!(tool = tool.label, "{line}"),
                None => {}
            }
        }

        if output.status.success() {
            return true;
        }
        if !reported_error {
            self.sink.emit(
                Diagnostic::error(tool.failure, format!("{} exited with {}", tool.label, output.status))
                    .for_project(self.project),
            );
        }
        false
    }

    fn diagnostic(&self, parsed: &ToolLine<'_>, sources: &SourceMap) -> Diagnostic {
        let (code, message) = match parsed.code.and_then(DiagnosticCode::parse) {
            Some(code) => (code, parsed.message.to_string()),
            None => match parsed.code {
                Some(foreign) => (codes::TOOL_DIAGNOSTIC, format!("{foreign}: {}", parsed.message)),
                None => (codes::TOOL_DIAGNOSTIC, parsed.message.to_string()),
            },
        };
        let file = self.working_dir.join(parsed.file);
        let file = sources.original(&file);
        let location = Location {
            file: file.to_path_buf(),
            line: parsed.line,
            column: parsed.line.and(parsed.column),
        };
        Diagnostic::error(code, message)
            .with_severity(parsed.severity)
            .at(location)
            .for_project(self.project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_location_forms() {
        let l = parse_line("obj/res/layout/main.xml:3:7: error APT2259: unexpected element").unwrap();
        assert_eq!(l.file, "obj/res/layout/main.xml");
        assert_eq!((l.line, l.column), (Some(3), Some(7)));
        assert_eq!(l.code, Some("APT2259"));
        assert_eq!(l.message, "unexpected element");

        let l = parse_line("Java/com/example/Foo.java:12: error: cannot find symbol").unwrap();
        assert_eq!((l.line, l.column, l.code), (Some(12), None, None));

        let l = parse_line("Foo.cs(4,2): warning CS0168: unused").unwrap();
        assert_eq!((l.line, l.column), (Some(4), Some(2)));
        assert_eq!(l.severity, Severity::Warning);

        assert!(parse_line("Note: Some input files use unchecked operations.").is_none());
    }

    #[test]
    fn missing_program_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let cx = BuildContext::default();
        let runner = ToolRunner::new(&cx, "App1", dir.path(), &sink);
        let tool = ToolCommand {
            label: "d8",
            command: "andpack-test-no-such-tool --release".into(),
            failure: codes::TOOL_FAILED,
        };
        assert!(!runner.run(&tool, &[], &SourceMap::default()));
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::TOOL_MISSING);
        assert_eq!(diags[0].project.as_deref(), Some("App1"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_errors_point_at_original_sources() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let mut map = BTreeMap::new();
        map.insert(res.join("layout/main.xml"), dir.path().join("Resources/layout/Main.xml"));
        let sources = SourceMap(map);

        let sink = DiagnosticSink::new();
        let cx = BuildContext::default();
        let runner = ToolRunner::new(&cx, "App1", dir.path(), &sink);
        let tool = ToolCommand {
            label: "resource compiler",
            command: "sh -c".into(),
            failure: codes::RESOURCE_TOOL_FAILED,
        };
        let script = "echo 'obj/res/layout/main.xml:2:5: error APT2259: bad attribute' >&2; exit 1";
        assert!(!runner.run(&tool, &[script.into()], &sources));

        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.to_string(), "APT2259");
        let location = diags[0].location.as_ref().unwrap();
        assert_eq!(location.file, dir.path().join("Resources/layout/Main.xml"));
        assert_eq!(location.line, Some(2));
    }

    #[cfg(unix)]
    #[test]
    fn silent_failures_get_the_failure_code() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let cx = BuildContext::default();
        let runner = ToolRunner::new(&cx, "App1", dir.path(), &sink);
        let tool = ToolCommand {
            label: "javac",
            command: "sh -c".into(),
            failure: codes::TOOL_FAILED,
        };
        assert!(!runner.run(&tool, &["exit 3".into()], &SourceMap::default()));
        assert_eq!(sink.take_all()[0].code, codes::TOOL_FAILED);
        assert!(runner.run(&tool, &["exit 0".into()], &SourceMap::default()));
        assert!(sink.take_all().is_empty());
    }
}
