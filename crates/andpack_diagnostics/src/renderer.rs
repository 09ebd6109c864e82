//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in the MSBuild line format build logs use.
///
/// Produces output like:
/// ```text
/// Resources/layout/Main.axml(4,5): error APT0004: No resource found that matches the given name (at 'text' with value '@string/foo').
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_text(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let color = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Message => "36",
        };
        format!("\x1b[{color}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();
        if let Some(loc) = &diag.location {
            out.push_str(&format!("{loc}: "));
        }
        out.push_str(&format!(
            "{} {}: {}\n",
            self.severity_text(diag.severity),
            diag.code,
            diag.message
        ));
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut line = serde_json::to_string(diag).unwrap_or_else(|e| {
            serde_json::json!({ "severity": "error", "message": e.to_string() }).to_string()
        });
        line.push('\n');
        line
    }
}

/// Returns the `N Warning(s)` / `N Error(s)` summary for a set of diagnostics.
pub fn summary_lines(diags: &[Diagnostic]) -> String {
    let warnings = diags.iter().filter(|d| d.severity == Severity::Warning).count();
    let errors = diags.iter().filter(|d| d.severity == Severity::Error).count();
    format!("    {warnings} Warning(s)\n    {errors} Error(s)\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::codes;
    use crate::location::Location;

    #[test]
    fn render_error_with_location() {
        let diag = Diagnostic::error(codes::UNRESOLVED_REFERENCE, "No resource found")
            .at(Location::at("Resources/layout/Main.axml", 4, 5));
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(
            out,
            "Resources/layout/Main.axml(4,5): error APT0004: No resource found\n"
        );
    }

    #[test]
    fn render_without_location() {
        let diag = Diagnostic::warning(codes::DUPLICATE_NATIVE_LIBRARY, "dup");
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(out, "warning PKG0002: dup\n");
    }

    #[test]
    fn render_notes() {
        let diag = Diagnostic::error(codes::CORRUPT_ARCHIVE, "bad").with_note("invalid zip header");
        let out = TerminalRenderer::new(false).render(&diag);
        assert!(out.contains("= note: invalid zip header"));
    }

    #[test]
    fn colored_severity() {
        let diag = Diagnostic::error(codes::CORRUPT_ARCHIVE, "bad");
        let out = TerminalRenderer::new(true).render(&diag);
        assert!(out.contains("\x1b[31merror\x1b[0m"));
    }

    #[test]
    fn json_render_is_one_line() {
        let diag = Diagnostic::error(codes::UNKNOWN_ABI, "Cannot determine ABI")
            .at(Location::file("libs/mips/libfoo.so"));
        let out = JsonRenderer.render(&diag);
        assert_eq!(out.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "Cannot determine ABI");
    }

    #[test]
    fn summary_counts() {
        let diags = vec![
            Diagnostic::error(codes::UNKNOWN_ABI, "a"),
            Diagnostic::warning(codes::DUPLICATE_NATIVE_LIBRARY, "b"),
            Diagnostic::warning(codes::DUPLICATE_NATIVE_LIBRARY, "c"),
        ];
        assert_eq!(summary_lines(&diags), "    2 Warning(s)\n    1 Error(s)\n");
    }
}
