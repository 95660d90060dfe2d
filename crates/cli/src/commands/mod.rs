//! CLI command definitions and execution
//!
//! Each command lives in its own module with an `Args` struct and an
//! `execute` function returning an exit code. Shared login and target
//! resolution live on [`Context`].

use clap::{Parser, Subcommand};
use hbp_core::{
    Archive, BackendKind, Config, ConfigManager, Container, EnvOrPrompt, Error, RemotePath,
    Result, Secret,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod acl;
mod cat;
mod completions;
mod config;
mod du;
mod find;
mod get;
mod ls;
mod mv;
mod projects;
mod put;
mod rm;
mod stat;

/// hbp - client for the HBP archival object storage
///
/// Browse projects and containers, download and upload files, and move or
/// delete objects. Public containers can be read by URL without logging in.
#[derive(Parser, Debug)]
#[command(name = "hbp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// User name for the identity service
    #[arg(short, long, global = true, env = "HBP_ARCHIVE_USERNAME")]
    pub username: Option<String>,

    /// Environment variable to read the password from
    #[arg(long, global = true, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Environment variable holding an already issued Keystone token
    #[arg(long, global = true, value_name = "VAR", conflicts_with = "password_env")]
    pub token_env: Option<String>,

    /// Storage backend: swift or s3
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the projects you are a member of
    Projects(projects::ProjectsArgs),

    /// List containers, or files in a container
    Ls(ls::LsArgs),

    /// Find the project holding a container
    Find(find::FindArgs),

    /// Show the size of a container or prefix
    Du(du::DuArgs),

    /// Show file metadata
    Stat(stat::StatArgs),

    /// Write file contents to stdout
    Cat(cat::CatArgs),

    /// Download a file, a prefix, or a whole container
    Get(get::GetArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Move or rename a file
    Mv(mv::MvArgs),

    /// Delete files
    Rm(rm::RmArgs),

    /// Show container access control lists
    Acl(acl::AclArgs),

    /// Show or initialise the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// State shared by the commands of one invocation
pub struct Context {
    pub formatter: Formatter,
    pub config: Config,
    username: Option<String>,
    password_env: Option<String>,
    token_env: Option<String>,
    archive: Option<Archive>,
}

impl Context {
    pub fn new(formatter: Formatter, config: Config) -> Self {
        Self {
            formatter,
            config,
            username: None,
            password_env: None,
            token_env: None,
            archive: None,
        }
    }

    /// Context whose archive is already open
    pub fn with_archive(formatter: Formatter, archive: Archive) -> Self {
        Self {
            archive: Some(archive),
            ..Self::new(formatter, Config::default())
        }
    }

    /// Log in and open the archive
    pub async fn archive(&self) -> Result<Archive> {
        if let Some(archive) = &self.archive {
            return Ok(archive.clone());
        }

        match self.config.endpoint.backend {
            BackendKind::Swift => {
                let username = self
                    .username
                    .clone()
                    .or_else(|| self.config.defaults.username.clone())
                    .ok_or_else(|| {
                        Error::Config(
                            "no user name: pass --username, set HBP_ARCHIVE_USERNAME, \
                             or set defaults.username"
                                .into(),
                        )
                    })?;
                if let Some(var) = &self.token_env {
                    let token = std::env::var(var)
                        .ok()
                        .filter(|t| !t.is_empty())
                        .ok_or_else(|| Error::Auth(format!("no token in {var}")))?;
                    return hbp_swift::open_archive_with_token(
                        &self.config,
                        &username,
                        Secret::new(token),
                    )
                    .await;
                }
                let var = self
                    .password_env
                    .clone()
                    .unwrap_or_else(|| self.config.endpoint.password_env.clone());
                let source = EnvOrPrompt::new(var);
                hbp_swift::open_archive(&self.config, &username, None, Some(&source)).await
            }
            BackendKind::S3 => hbp_s3::open_archive(&self.config, None, None).await,
        }
    }

    /// Container and key named by `target`
    ///
    /// `target` is either a public container URL, read without logging in,
    /// or `container[/key]`, looked up in `project` or else in the first
    /// project holding a container of that name.
    pub async fn resolve(
        &self,
        target: &str,
        project: Option<&str>,
    ) -> Result<(Container, String)> {
        if is_url(target) {
            let public = hbp_swift::open_public_container(target, &self.config)?;
            return Ok((public.as_container().clone(), String::new()));
        }

        let path = RemotePath::parse(target)?;
        let archive = self.archive().await?;
        let container = match project {
            Some(name) => archive.project(name).await?.get_container(&path.container).await?,
            None => archive.find_container(&path.container).await?,
        };
        Ok((container, path.key))
    }
}

/// Whether `target` is a URL rather than `container[/key]`
pub fn is_url(target: &str) -> bool {
    target.starts_with("https://") || target.starts_with("http://")
}

/// Like [`Context::resolve`], failing with a usage error when no key is given
pub async fn resolve_object(
    ctx: &Context,
    target: &str,
    project: Option<&str>,
) -> Result<(Container, String)> {
    let (container, key) = ctx.resolve(target, project).await?;
    if key.is_empty() || key.ends_with('/') {
        return Err(Error::InvalidPath(format!(
            "'{target}' does not name a file: expected container/path"
        )));
    }
    Ok((container, key))
}

fn output_config(cli: &Cli, config: &Config) -> OutputConfig {
    OutputConfig {
        json: cli.json || config.defaults.output == "json",
        no_color: cli.no_color || config.defaults.color == "never",
        no_progress: cli.no_progress || !config.defaults.progress,
        quiet: cli.quiet,
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags_only = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Completions(args) => return completions::execute(args),
        Commands::Config(cmd) => return config::execute(cmd, Formatter::new(flags_only)).await,
        _ => {}
    }

    let mut config = match ConfigManager::new().and_then(|m| m.load()) {
        Ok(config) => config,
        Err(e) => return Formatter::new(flags_only).fail(&e),
    };
    if let Some(backend) = cli.backend {
        config.endpoint.backend = backend;
    }

    let formatter = Formatter::new(output_config(&cli, &config));
    let ctx = Context {
        username: cli.username,
        password_env: cli.password_env,
        token_env: cli.token_env,
        ..Context::new(formatter, config)
    };

    match cli.command {
        Commands::Projects(args) => projects::execute(args, &ctx).await,
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Find(args) => find::execute(args, &ctx).await,
        Commands::Du(args) => du::execute(args, &ctx).await,
        Commands::Stat(args) => stat::execute(args, &ctx).await,
        Commands::Cat(args) => cat::execute(args, &ctx).await,
        Commands::Get(args) => get::execute(args, &ctx).await,
        Commands::Put(args) => put::execute(args, &ctx).await,
        Commands::Mv(args) => mv::execute(args, &ctx).await,
        Commands::Rm(args) => rm::execute(args, &ctx).await,
        Commands::Acl(args) => acl::execute(args, &ctx).await,
        Commands::Config(_) | Commands::Completions(_) => ExitCode::Success,
    }
}
