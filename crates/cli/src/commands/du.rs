//! du command - Size of a container or prefix

use clap::Args;
use hbp_core::{Result, SizeUnit};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Show the size of a container or prefix
#[derive(Args, Debug)]
pub struct DuArgs {
    /// container[/prefix] or public container URL
    pub target: String,

    /// Restrict the search to one project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Unit: B, KB, MB, GB or TB (powers of 1024)
    #[arg(long, default_value = "MB")]
    pub unit: SizeUnit,
}

#[derive(Debug, Serialize, PartialEq)]
struct DuOutput {
    container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    count: usize,
    size: f64,
    unit: SizeUnit,
}

async fn measure(ctx: &Context, args: &DuArgs) -> Result<DuOutput> {
    let (container, prefix) = ctx.resolve(&args.target, args.project.as_deref()).await?;
    let prefix = (!prefix.is_empty()).then_some(prefix);
    let count = container.count(prefix.as_deref()).await?;
    let size = container.size(args.unit, prefix.as_deref()).await?;
    Ok(DuOutput {
        container: container.to_string(),
        prefix,
        count,
        size,
        unit: args.unit,
    })
}

/// Execute the du command
pub async fn execute(args: DuArgs, ctx: &Context) -> ExitCode {
    let output = match measure(ctx, &args).await {
        Ok(output) => output,
        Err(e) => return ctx.formatter.fail(&e),
    };

    if ctx.formatter.is_json() {
        ctx.formatter.json(&output);
    } else {
        let target = match &output.prefix {
            Some(prefix) => format!("{}/{}", output.container, prefix),
            None => output.container.clone(),
        };
        ctx.formatter.println(&format!(
            "{:.4} {}\t{} files\t{}",
            output.size, output.unit, output.count, target
        ));
    }
    ExitCode::Success
}
