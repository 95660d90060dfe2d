//! put command - Upload a local file

use std::path::PathBuf;

use clap::Args;
use hbp_core::{Error, File, Result, path::join_key};

use super::Context;
use crate::exit_code::ExitCode;

/// Upload a local file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub local: PathBuf,

    /// container[/path]; a missing name or trailing slash keeps the local file name
    pub target: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Remote name for `local` given the key parsed from the target
fn remote_name(local: &std::path::Path, key: &str) -> Result<String> {
    if !key.is_empty() && !key.ends_with('/') {
        return Ok(key.to_string());
    }
    let file_name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(format!("'{}' has no file name", local.display())))?;
    Ok(join_key(key, file_name))
}

async fn upload(ctx: &Context, args: &PutArgs) -> Result<File> {
    let metadata = tokio::fs::metadata(&args.local)
        .await
        .map_err(Error::local_io("stat", &args.local))?;
    if !metadata.is_file() {
        return Err(Error::InvalidPath(format!(
            "'{}' is not a file",
            args.local.display()
        )));
    }
    let (container, key) = ctx.resolve(&args.target, args.project.as_deref()).await?;
    let remote = remote_name(&args.local, &key)?;
    container.upload(&args.local, &remote).await
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &Context) -> ExitCode {
    match upload(ctx, &args).await {
        Ok(file) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&file);
            } else {
                ctx.formatter.success(&format!(
                    "{} -> {}/{}",
                    args.local.display(),
                    file.container(),
                    file.name()
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.formatter.fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::commands::testing::demo_context;

    #[test]
    fn test_remote_name() {
        let local = Path::new("/tmp/report.csv");
        assert_eq!(remote_name(local, "").unwrap(), "report.csv");
        assert_eq!(remote_name(local, "in/").unwrap(), "in/report.csv");
        assert_eq!(
            remote_name(local, "in/renamed.csv").unwrap(),
            "in/renamed.csv"
        );
    }

    #[tokio::test]
    async fn test_put_uploads() {
        let (ctx, store) = demo_context().await;
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.txt");
        std::fs::write(&local, b"hello").unwrap();

        let args = PutArgs {
            local,
            target: "demo/docs/".into(),
            project: None,
        };
        let file = upload(&ctx, &args).await.unwrap();
        assert_eq!(file.name(), "docs/notes.txt");
        assert_eq!(file.bytes(), Some(5));
        assert!(store.contains("demo", "docs/notes.txt").await);
    }

    #[tokio::test]
    async fn test_put_missing_local_file() {
        let (ctx, _) = demo_context().await;
        let args = PutArgs {
            local: PathBuf::from("/nonexistent/file.bin"),
            target: "demo".into(),
            project: None,
        };
        let err = upload(&ctx, &args).await.unwrap_err();
        assert!(
            err.to_string().starts_with("stat /nonexistent/file.bin: "),
            "{err}"
        );
        assert_eq!(execute(args, &ctx).await, ExitCode::GeneralError);
    }
}
