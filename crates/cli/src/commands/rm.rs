//! rm command - Delete objects
//!
//! Every path is attempted; the exit code is that of the last failure.

use clap::Args;
use hbp_core::Result;
use serde::Serialize;

use super::{Context, resolve_object};
use crate::exit_code::ExitCode;

/// Delete one or more objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to delete (container/path)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
    total: usize,
}

async fn remove(ctx: &Context, target: &str, project: Option<&str>) -> Result<()> {
    let (container, key) = resolve_object(ctx, target, project).await?;
    container.delete(&key).await
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut code = ExitCode::Success;

    for target in &args.paths {
        match remove(ctx, target, args.project.as_deref()).await {
            Ok(()) => deleted.push(target.clone()),
            Err(e) => {
                code = ctx.formatter.fail(&e);
                failed.push(target.clone());
            }
        }
    }

    if ctx.formatter.is_json() {
        ctx.formatter.json(&RmOutput {
            status: if failed.is_empty() {
                "success"
            } else {
                "partial"
            },
            total: deleted.len(),
            deleted,
            failed,
        });
    } else if !deleted.is_empty() {
        ctx.formatter
            .success(&format!("Removed {} object(s).", deleted.len()));
    }
    code
}
