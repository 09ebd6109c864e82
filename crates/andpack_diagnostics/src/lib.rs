//! Diagnostic creation, severity management, and rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with stable
//! machine-readable codes (`APT0004`, `PKG0001`, ...), severities, and
//! optional 1-based source locations pointing at the original project file.
//! The thread-safe [`DiagnosticSink`] accumulates diagnostics while targets
//! run, and [`DiagnosticRenderer`] implementations format them MSBuild-style
//! for terminals or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{codes, Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{summary_lines, DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
