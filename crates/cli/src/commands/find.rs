//! find command - Locate a container among the user's projects

use clap::Args;
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Find a container by name
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Container name
    pub name: String,
}

#[derive(Debug, Serialize)]
struct FindOutput<'a> {
    project: Option<&'a str>,
    container: &'a str,
}

/// Execute the find command
pub async fn execute(args: FindArgs, ctx: &Context) -> ExitCode {
    let container = match ctx.archive().await {
        Ok(archive) => archive.find_container(&args.name).await,
        Err(e) => Err(e),
    };

    match container {
        Ok(container) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&FindOutput {
                    project: container.project(),
                    container: container.name(),
                });
            } else {
                ctx.formatter.println(&container.to_string());
            }
            ExitCode::Success
        }
        Err(e) => ctx.formatter.fail(&e),
    }
}
