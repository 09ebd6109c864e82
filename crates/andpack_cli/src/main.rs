//! andpack CLI: builds Android application and library projects
//! incrementally.
//!
//! `andpack build` runs the target graph of a project and everything it
//! references, `andpack clean` removes build outputs, and `andpack init`
//! scaffolds a new project.

#![warn(missing_docs)]

mod build;
mod clean;
mod init;
mod logging;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// andpack: incremental resource, asset and native library packaging for
/// Android projects.
#[derive(Parser, Debug)]
#[command(name = "andpack", version, about = "Incremental Android packaging")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Format of log events on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a project and the projects it references.
    Build(BuildArgs),
    /// Remove build outputs.
    Clean(CleanArgs),
    /// Create a new project.
    Init {
        /// Project name; a directory of that name is created.
        name: String,

        /// Create a library project producing an `.aar`.
        #[arg(long)]
        library: bool,

        /// Application id; defaults to `com.example.<name>`.
        #[arg(long)]
        package: Option<String>,
    },
}

/// Arguments for `andpack build`.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Project directory (default: current directory).
    pub project: Option<PathBuf>,

    /// Configuration (profile) to build.
    #[arg(short, long, default_value = "Debug")]
    pub configuration: String,

    /// Run the design-time pass only: designer and bindings, no packaging.
    #[arg(long)]
    pub design_time: bool,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `andpack clean`.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Project directory (default: current directory).
    pub project: Option<PathBuf>,

    /// Configuration whose outputs are removed.
    #[arg(short, long, default_value = "Debug")]
    pub configuration: String,

    /// Remove only design-time state.
    #[arg(long)]
    pub design_time: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// MSBuild-style lines.
    Text,
    /// One JSON object per diagnostic.
    Json,
}

/// Log event format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    logging::init(cli.verbose, cli.quiet, cli.log_format, color);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
        Command::Init { name, library, package } => init::run(&name, library, package.as_deref(), &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// The directory a command operates on.
pub(crate) fn project_dir(arg: Option<&PathBuf>) -> std::io::Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir(),
    }
}
