//! `tracing` subscriber setup.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::LogFormat;

/// Variable holding `EnvFilter` directives; it overrides `-v`/`-q`.
pub const LOG_VARIABLE: &str = "ANDPACK_LOG";

/// The level implied by the command-line flags.
fn default_level(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Builds the filter from `ANDPACK_LOG`, falling back to the flags when the
/// variable is unset or invalid.
fn env_filter(directives: Option<&str>, verbose: bool, quiet: bool) -> EnvFilter {
    let fallback = || EnvFilter::default().add_directive(default_level(verbose, quiet).into());
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
        None => fallback(),
    }
}

/// Installs the global subscriber, writing to stderr.
pub fn init(verbose: bool, quiet: bool, format: LogFormat, color: bool) {
    let directives = std::env::var(LOG_VARIABLE).ok();
    let filter = env_filter(directives.as_deref(), verbose, quiet);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.with_ansi(color).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("warning: logging not initialised: {e}");
    }
}
