//! stat command - Show file metadata

use clap::Args;
use hbp_core::{File, Result, format_size};

use super::{Context, resolve_object};
use crate::exit_code::ExitCode;

/// Show file metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// container/path
    pub path: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

async fn lookup(ctx: &Context, args: &StatArgs) -> Result<File> {
    let (container, key) = resolve_object(ctx, &args.path, args.project.as_deref()).await?;
    container.get(&key).await
}

fn describe(file: &File) -> Vec<String> {
    let mut lines = vec![
        format!("Name      : {}", file.name()),
        format!("Container : {}", file.container()),
    ];
    if let Some(modified) = file.last_modified() {
        lines.push(format!("Date      : {}", modified.strftime("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(size) = file.bytes() {
        lines.push(format!("Size      : {} ({size} bytes)", format_size(size)));
    }
    if let Some(hash) = file.hash() {
        lines.push(format!("Hash      : {hash}"));
    }
    if let Some(ct) = file.content_type() {
        lines.push(format!("Type      : {ct}"));
    }
    lines
}

/// Execute the stat command
pub async fn execute(args: StatArgs, ctx: &Context) -> ExitCode {
    match lookup(ctx, &args).await {
        Ok(file) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&file);
            } else {
                for line in describe(&file) {
                    ctx.formatter.println(&line);
                }
            }
            ExitCode::Success
        }
        Err(e) => ctx.formatter.fail(&e),
    }
}
