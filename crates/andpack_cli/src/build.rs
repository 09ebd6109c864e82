//! `andpack build`: builds a project and the projects it references.

use std::time::Instant;

use andpack_build::{BuildContext, Namespace, ProjectOutcome, ProjectResult, Workspace};
use andpack_diagnostics::{summary_lines, Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};

use crate::{project_dir, BuildArgs, GlobalArgs, ReportFormat};

/// Runs the `andpack build` command. Returns exit code 0 on success, 1 when
/// any project failed.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let started = Instant::now();
    let dir = project_dir(args.project.as_ref())?;
    let workspace = Workspace::load(&dir, &args.configuration)?;
    let namespace = if args.design_time {
        Namespace::DesignTime
    } else {
        Namespace::Full
    };

    if !global.quiet {
        let projects = match namespace {
            Namespace::Full => workspace.build_order()?,
            Namespace::DesignTime => vec![workspace.root()],
        };
        for project in projects {
            eprintln!(
                "   Building {} v{} ({})",
                project.name(),
                project.config.project.version,
                args.configuration
            );
        }
    }

    let context = BuildContext::from_env(&args.configuration);
    let results = workspace.build(&context, namespace)?;

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for result in &results {
        if let ProjectOutcome::Finished(report) = &result.outcome {
            diagnostics.extend(report.diagnostics.iter().cloned());
        }
    }
    render_diagnostics(&diagnostics, args.format, global);
    for result in &results {
        report_project(result, global);
    }

    let failed = results.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        eprintln!("error: {failed} of {} project(s) failed", results.len());
        return Ok(1);
    }
    if !global.quiet {
        let kind = if args.design_time { "design-time" } else { "full" };
        eprintln!(
            "    Finished {} {kind} build of {} in {:.2}s",
            args.configuration,
            workspace.root().name(),
            started.elapsed().as_secs_f64()
        );
    }
    Ok(0)
}

fn render_diagnostics(diagnostics: &[Diagnostic], format: ReportFormat, global: &GlobalArgs) {
    match format {
        ReportFormat::Json => {
            let renderer = JsonRenderer;
            for diag in diagnostics {
                print!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in diagnostics {
                if global.quiet && !diag.severity.is_error() {
                    continue;
                }
                eprint!("{}", renderer.render(diag));
            }
            if !global.quiet && !diagnostics.is_empty() {
                eprint!("{}", summary_lines(diagnostics));
            }
        }
    }
}

fn report_project(result: &ProjectResult, global: &GlobalArgs) {
    match &result.outcome {
        ProjectOutcome::Finished(report) => {
            if global.verbose {
                for target in &report.targets {
                    eprintln!("      {} {}: {}", result.name, target.name, target.status);
                }
            }
        }
        ProjectOutcome::Aborted(err) => {
            eprintln!("error: {}: {err}", result.name);
        }
        ProjectOutcome::Blocked => {
            eprintln!(
                "error: {} was not built because a project it references failed",
                result.name
            );
        }
    }
}
