//! Configuration file commands
//!
//! The configuration file holds the identity endpoint, the default user name
//! and output preferences. Passwords are never written to it.

use clap::Subcommand;
use hbp_core::{BackendKind, Config, ConfigManager, Result};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration file location and effective settings
    Show,

    /// Write a configuration file
    Init(InitArgs),
}

/// Arguments for the `config init` command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Default user name
    #[arg(long)]
    pub username: Option<String>,

    /// Storage backend: swift or s3
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Keystone v3 URL
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Object-store root used instead of the service catalog
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Replace an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    path: String,
    config: &'a Config,
}

/// Execute a config subcommand
pub async fn execute(cmd: ConfigCommands, formatter: Formatter) -> ExitCode {
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => return formatter.fail(&e),
    };

    match cmd {
        ConfigCommands::Show => show(&manager, &formatter),
        ConfigCommands::Init(args) => match init(&manager, &args) {
            Ok(true) => {
                formatter.success(&format!(
                    "Configuration written to {}",
                    manager.config_path().display()
                ));
                ExitCode::Success
            }
            Ok(false) => {
                formatter.error(&format!(
                    "{} already exists (use --force to replace it)",
                    manager.config_path().display()
                ));
                ExitCode::Conflict
            }
            Err(e) => formatter.fail(&e),
        },
    }
}

fn show(manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let config = match manager.load() {
        Ok(config) => config,
        Err(e) => return formatter.fail(&e),
    };

    if formatter.is_json() {
        formatter.json(&ShowOutput {
            path: manager.config_path().display().to_string(),
            config: &config,
        });
        return ExitCode::Success;
    }

    match toml::to_string_pretty(&config) {
        Ok(text) => {
            formatter.println(&format!("# {}", manager.config_path().display()));
            formatter.println(text.trim_end());
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to render configuration: {e}"));
            ExitCode::GeneralError
        }
    }
}

/// Write the configuration; `Ok(false)` if a file exists and `force` is unset
fn init(manager: &ConfigManager, args: &InitArgs) -> Result<bool> {
    if manager.config_path().exists() && !args.force {
        return Ok(false);
    }

    let mut config = Config::default();
    config.defaults.username = args.username.clone();
    if let Some(backend) = args.backend {
        config.endpoint.backend = backend;
    }
    if let Some(auth_url) = &args.auth_url {
        config.endpoint.auth_url = auth_url.clone();
    }
    config.endpoint.storage_url = args.storage_url.clone();

    manager.save(&config)?;
    tracing::debug!(path = %manager.config_path().display(), "Configuration saved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (ConfigManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        (manager, dir)
    }

    fn init_args(username: &str, force: bool) -> InitArgs {
        InitArgs {
            username: Some(username.into()),
            backend: None,
            auth_url: None,
            storage_url: None,
            force,
        }
    }

    #[test]
    fn test_init_writes_defaults() {
        let (manager, _dir) = manager();
        assert!(init(&manager, &init_args("alice", false)).unwrap());

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.username.as_deref(), Some("alice"));
        assert_eq!(config.endpoint.backend, BackendKind::Swift);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let (manager, _dir) = manager();
        assert!(init(&manager, &init_args("alice", false)).unwrap());
        assert!(!init(&manager, &init_args("bob", false)).unwrap());
        assert_eq!(
            manager.load().unwrap().defaults.username.as_deref(),
            Some("alice")
        );

        assert!(init(&manager, &init_args("bob", true)).unwrap());
        assert_eq!(
            manager.load().unwrap().defaults.username.as_deref(),
            Some("bob")
        );
    }
}
