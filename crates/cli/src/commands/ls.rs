//! ls command - List containers and files
//!
//! Without a target, lists the containers of every project (or of one
//! project). With `container[/prefix]` or a public container URL, lists the
//! files, optionally filtered by a glob pattern.

use clap::Args;
use hbp_core::{Container, File, Result, format_size};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::{Align, render_table};

/// List containers or files
#[derive(Args, Debug)]
pub struct LsArgs {
    /// container[/prefix] or public container URL; omit to list containers
    pub target: Option<String>,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Only show files whose full name matches this glob (e.g. "*.swc")
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ContainerRow {
    project: String,
    container: String,
    objects: u64,
    bytes: u64,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let pattern = match args.pattern.as_deref().map(glob::Pattern::new).transpose() {
        Ok(p) => p,
        Err(e) => {
            ctx.formatter.error(&format!("Invalid pattern: {e}"));
            return ExitCode::UsageError;
        }
    };

    let result = match &args.target {
        None => list_containers(ctx, args.project.as_deref()).await,
        Some(target) => list_files(ctx, target, args.project.as_deref(), pattern.as_ref()).await,
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => ctx.formatter.fail(&e),
    }
}

async fn container_rows(ctx: &Context, project: Option<&str>) -> Result<Vec<ContainerRow>> {
    let archive = ctx.archive().await?;
    let projects = match project {
        Some(name) => vec![archive.project(name).await?],
        None => archive.projects().await?,
    };

    let mut rows = Vec::new();
    for project in &projects {
        let containers: Vec<Container> = project.containers().await?;
        let summaries = project_summaries(project, &containers).await?;
        rows.extend(summaries);
    }
    Ok(rows)
}

async fn project_summaries(
    project: &hbp_core::Project,
    containers: &[Container],
) -> Result<Vec<ContainerRow>> {
    let mut rows = Vec::with_capacity(containers.len());
    for container in containers {
        let stats = container.stats().await?;
        rows.push(ContainerRow {
            project: project.name().to_string(),
            container: container.name().to_string(),
            objects: stats.object_count,
            bytes: stats.bytes_used,
        });
    }
    Ok(rows)
}

async fn list_containers(ctx: &Context, project: Option<&str>) -> Result<()> {
    let rows = container_rows(ctx, project).await?;

    if ctx.formatter.is_json() {
        ctx.formatter.json(&rows);
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.project.clone(),
                r.container.clone(),
                r.objects.to_string(),
                format_size(r.bytes),
            ]
        })
        .collect();
    ctx.formatter.println(&render_table(
        &[
            ("PROJECT", Align::Left),
            ("CONTAINER", Align::Left),
            ("OBJECTS", Align::Right),
            ("SIZE", Align::Right),
        ],
        &table,
    ));
    Ok(())
}

/// Files under `prefix`, keeping those whose name matches `pattern`
async fn matching_files(
    container: &Container,
    prefix: &str,
    pattern: Option<&glob::Pattern>,
) -> Result<Vec<File>> {
    let prefix = (!prefix.is_empty()).then_some(prefix);
    let files = container.list(prefix).await?;
    Ok(match pattern {
        Some(p) => files.into_iter().filter(|f| p.matches(f.name())).collect(),
        None => files,
    })
}

async fn list_files(
    ctx: &Context,
    target: &str,
    project: Option<&str>,
    pattern: Option<&glob::Pattern>,
) -> Result<()> {
    let (container, prefix) = ctx.resolve(target, project).await?;
    let files = matching_files(&container, &prefix, pattern).await?;

    if ctx.formatter.is_json() {
        ctx.formatter.json(&files);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = files
        .iter()
        .map(|f| {
            vec![
                f.bytes().map(format_size).unwrap_or_default(),
                f.last_modified()
                    .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                f.name().to_string(),
            ]
        })
        .collect();
    ctx.formatter.println(&render_table(
        &[
            ("SIZE", Align::Right),
            ("MODIFIED", Align::Left),
            ("NAME", Align::Left),
        ],
        &rows,
    ));
    Ok(())
}
