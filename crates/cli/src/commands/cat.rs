//! cat command - Write file contents to stdout
//!
//! Streams the object so large files are never held in memory.

use clap::Args;
use hbp_core::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{Context, resolve_object};
use crate::exit_code::ExitCode;

/// Write file contents to stdout
#[derive(Args, Debug)]
pub struct CatArgs {
    /// container/path
    pub path: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

async fn copy_to<W: AsyncWrite + Unpin>(ctx: &Context, args: &CatArgs, out: &mut W) -> Result<u64> {
    let (container, key) = resolve_object(ctx, &args.path, args.project.as_deref()).await?;
    let mut stream = container.open(&key).await?;
    let written = stream.copy_to(out).await?;
    out.flush().await?;
    Ok(written)
}

/// Execute the cat command
pub async fn execute(args: CatArgs, ctx: &Context) -> ExitCode {
    let mut stdout = tokio::io::stdout();
    match copy_to(ctx, &args, &mut stdout).await {
        Ok(_) => ExitCode::Success,
        Err(e) => ctx.formatter.fail(&e),
    }
}
