//! acl command - Show container access control lists

use clap::Args;
use hbp_core::{AccessControl, Result};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Show who may read and write a container
#[derive(Args, Debug)]
pub struct AclArgs {
    /// Container name
    pub container: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
struct AclOutput {
    container: String,
    #[serde(flatten)]
    acl: AccessControl,
}

async fn fetch(ctx: &Context, args: &AclArgs) -> Result<AclOutput> {
    let (container, _) = ctx.resolve(&args.container, args.project.as_deref()).await?;
    let acl = container.access_control().await?;
    Ok(AclOutput {
        container: container.to_string(),
        acl,
    })
}

fn render(list: &[String]) -> String {
    if list.is_empty() {
        "-".to_string()
    } else {
        list.join(",")
    }
}

/// Execute the acl command
pub async fn execute(args: AclArgs, ctx: &Context) -> ExitCode {
    match fetch(ctx, &args).await {
        Ok(output) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&output);
            } else {
                ctx.formatter
                    .println(&format!("Container : {}", output.container));
                ctx.formatter
                    .println(&format!("Read      : {}", render(&output.acl.read)));
                ctx.formatter
                    .println(&format!("Write     : {}", render(&output.acl.write)));
            }
            ExitCode::Success
        }
        Err(e) => ctx.formatter.fail(&e),
    }
}
