//! projects command - List the user's projects

use clap::Args;
use hbp_core::ProjectInfo;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::{Align, render_table};

/// List projects
#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Also show project ids
    #[arg(long)]
    pub ids: bool,
}

/// Execute the projects command
pub async fn execute(args: ProjectsArgs, ctx: &Context) -> ExitCode {
    let projects = match ctx.archive().await {
        Ok(archive) => archive.projects().await,
        Err(e) => Err(e),
    };
    let projects: Vec<ProjectInfo> = match projects {
        Ok(projects) => projects.iter().map(|p| p.info().clone()).collect(),
        Err(e) => return ctx.formatter.fail(&e),
    };

    if ctx.formatter.is_json() {
        ctx.formatter.json(&projects);
    } else if args.ids {
        let rows: Vec<Vec<String>> = projects
            .iter()
            .map(|p| vec![p.name.clone(), p.id.clone()])
            .collect();
        ctx.formatter.println(&render_table(
            &[("PROJECT", Align::Left), ("ID", Align::Left)],
            &rows,
        ));
    } else {
        for project in &projects {
            ctx.formatter.println(&project.name);
        }
    }

    ExitCode::Success
}
