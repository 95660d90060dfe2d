//! get command - Download files
//!
//! `container/path` downloads one file. `container`, `container/prefix/` or a
//! public URL downloads every matching file, keeping the remote directory
//! structure under the target directory.

use std::path::PathBuf;

use clap::Args;
use hbp_core::{DownloadReport, Result, SizeUnit};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Download a file, a prefix, or a whole container
#[derive(Args, Debug)]
pub struct GetArgs {
    /// container/path, container[/prefix/] or public container URL
    pub target: String,

    /// Local directory to download into
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Replace files that already exist locally
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    downloaded: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
}

async fn run(ctx: &Context, args: &GetArgs) -> Result<DownloadReport> {
    let (container, key) = ctx.resolve(&args.target, args.project.as_deref()).await?;

    if !key.is_empty() && !key.ends_with('/') {
        let written = container.download(&key, &args.dir, args.overwrite).await?;
        return Ok(DownloadReport {
            downloaded: vec![written],
            skipped: Vec::new(),
        });
    }

    let prefix = (!key.is_empty()).then_some(key.as_str());
    let total = container.size(SizeUnit::Bytes, prefix).await?;
    let progress = ProgressBar::new(ctx.formatter.config(), total as u64);
    let report = container
        .download_matching(prefix, &args.dir, args.overwrite, |file| {
            progress.set_message(file.name());
            progress.inc(file.bytes().unwrap_or(0));
        })
        .await;
    progress.finish_and_clear();
    report
}

/// Execute the get command
pub async fn execute(args: GetArgs, ctx: &Context) -> ExitCode {
    let report = match run(ctx, &args).await {
        Ok(report) => report,
        Err(e) => return ctx.formatter.fail(&e),
    };

    if ctx.formatter.is_json() {
        ctx.formatter.json(&GetOutput {
            downloaded: report.downloaded,
            skipped: report.skipped,
        });
        return ExitCode::Success;
    }

    for path in &report.skipped {
        ctx.formatter
            .warning(&format!("Skipped {} (exists, use --overwrite)", path.display()));
    }
    ctx.formatter.success(&format!(
        "Downloaded {} file(s) to {}",
        report.downloaded.len(),
        args.dir.display()
    ));
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use hbp_core::Error;

    use super::*;
    use crate::commands::testing::demo_context;

    fn args(target: &str, dir: &std::path::Path, overwrite: bool) -> GetArgs {
        GetArgs {
            target: target.into(),
            dir: dir.to_path_buf(),
            project: None,
            overwrite,
        }
    }

    #[tokio::test]
    async fn test_get_single_file() {
        let (ctx, _) = demo_context().await;
        let dir = tempfile::tempdir().unwrap();
        let report = run(&ctx, &args("demo/sub/b.txt", dir.path(), false)).await.unwrap();
        assert_eq!(
            report.downloaded,
            vec![dir.path().join("sub").join("b.txt")]
        );

        let again = run(&ctx, &args("demo/sub/b.txt", dir.path(), false)).await;
        assert!(matches!(again, Err(Error::FileExists(_))));
        assert_eq!(
            execute(args("demo/sub/b.txt", dir.path(), false), &ctx).await,
            ExitCode::Conflict
        );
    }

    #[tokio::test]
    async fn test_get_container_skips_existing() {
        let (ctx, _) = demo_context().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"mine").unwrap();

        let report = run(&ctx, &args("demo", dir.path(), false)).await.unwrap();
        assert_eq!(report.downloaded.len(), 1);
        assert_eq!(report.skipped, vec![dir.path().join("a.txt")]);
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"mine");
    }

    #[tokio::test]
    async fn test_get_prefix() {
        let (ctx, _) = demo_context().await;
        let dir = tempfile::tempdir().unwrap();
        let report = run(&ctx, &args("demo/sub/", dir.path(), true)).await.unwrap();
        assert_eq!(
            report.downloaded,
            vec![dir.path().join("sub").join("b.txt")]
        );
        assert!(!dir.path().join("a.txt").exists());
    }
}
