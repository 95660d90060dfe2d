//! mv command - Move or rename an object
//!
//! Moves are a copy followed by a delete of the source. If the delete fails
//! the object exists in both places and the command exits with code 8.

use clap::Args;
use hbp_core::{File, MoveOptions, Result, path};
use serde::Serialize;

use super::{Context, resolve_object};
use crate::exit_code::ExitCode;

/// Move or rename an object
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source: container/path
    pub source: String,

    /// Destination: container, container/dir/ or container/dir/name
    pub target: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
struct MvOutput {
    source: String,
    target: String,
}

/// Directory and name the destination key asks for
///
/// An empty key keeps the source directory and name, a trailing slash keeps
/// only the name.
fn destination(key: &str) -> (Option<&str>, Option<&str>) {
    if key.is_empty() {
        (None, None)
    } else if key.ends_with('/') {
        (Some(key.trim_end_matches('/')), None)
    } else {
        (Some(path::dirname(key)), Some(path::basename(key)))
    }
}

async fn relocate(ctx: &Context, args: &MvArgs) -> Result<File> {
    let project = args.project.as_deref();
    let (source, key) = resolve_object(ctx, &args.source, project).await?;
    let (dest, dest_key) = ctx.resolve(&args.target, project).await?;

    let (directory, new_name) = destination(&dest_key);
    let mut options = MoveOptions::default().to_container(&dest);
    if let Some(directory) = directory {
        options = options.to_directory(directory);
    }
    if let Some(new_name) = new_name {
        options = options.renamed(new_name);
    }
    source.move_to(&key, options).await
}

/// Execute the mv command
pub async fn execute(args: MvArgs, ctx: &Context) -> ExitCode {
    match relocate(ctx, &args).await {
        Ok(file) => {
            let target = format!("{}/{}", file.container(), file.name());
            if ctx.formatter.is_json() {
                ctx.formatter.json(&MvOutput {
                    source: args.source,
                    target,
                });
            } else {
                ctx.formatter.success(&format!("{} -> {target}", args.source));
            }
            ExitCode::Success
        }
        Err(e) => ctx.formatter.fail(&e),
    }
}
