//! `andpack clean`: removes build outputs of one project.

use andpack_build::{clean_project, Namespace, Project};

use crate::{project_dir, CleanArgs, GlobalArgs};

/// Runs the `andpack clean` command.
///
/// `--design-time` removes only `<intermediate>/designtime`, leaving full
/// build outputs in place.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = project_dir(args.project.as_ref())?;
    let project = Project::load(&dir, &args.configuration)?;
    let namespace = if args.design_time {
        Namespace::DesignTime
    } else {
        Namespace::Full
    };
    clean_project(&project, namespace)?;
    if !global.quiet {
        let what = if args.design_time { "design-time state of " } else { "" };
        eprintln!("     Cleaned {what}{}", project.name());
    }
    Ok(0)
}
