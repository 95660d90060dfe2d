//! Configuration management
//!
//! This module handles loading, saving, and migrating the configuration file.
//! The configuration file is stored in TOML format at
//! ~/.config/hbp-archive/config.toml, or under `$HBP_ARCHIVE_CONFIG_DIR`.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credentials::PASSWORD_ENV;
use crate::error::{Error, Result};

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "HBP_ARCHIVE_CONFIG_DIR";

/// Keystone endpoint of the CSCS deployment
pub const DEFAULT_AUTH_URL: &str = "https://pollux.cscs.ch:13000/v3";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "schema_version")]
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Identity and storage endpoint
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Network timeouts
    #[serde(default)]
    pub timeout: TimeoutConfig,

    /// S3-compatible gateway, used when `endpoint.backend = "s3"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            endpoint: EndpointConfig::default(),
            timeout: TimeoutConfig::default(),
            s3: None,
        }
    }
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Username used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
            username: None,
        }
    }
}

/// Which adapter talks to the storage service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Swift,
    S3,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "swift" => Ok(BackendKind::Swift),
            "s3" => Ok(BackendKind::S3),
            other => Err(Error::Config(format!(
                "unknown backend '{other}': expected swift or s3"
            ))),
        }
    }
}

/// Identity service and object-store endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Keystone v3 URL
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Keystone domain of the user
    #[serde(default = "default_domain")]
    pub user_domain: String,

    /// Catalog interface used to find the object-store endpoint
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Environment variable holding the password
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Object-store root (`<endpoint>/v1`) used instead of the catalog entry;
    /// each project's account is `<root>/AUTH_<project id>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_domain() -> String {
    crate::credentials::DEFAULT_DOMAIN.to_string()
}

fn default_interface() -> String {
    "public".to_string()
}

fn default_password_env() -> String {
    PASSWORD_ENV.to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            auth_url: default_auth_url(),
            user_domain: default_domain(),
            interface: default_interface(),
            password_env: default_password_env(),
            storage_url: None,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_ms)
    }
}

/// S3-compatible gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 endpoint URL
    pub endpoint: String,

    /// Region name
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    pub access_key: String,

    /// Environment variable holding the secret key
    #[serde(default = "default_secret_env")]
    pub secret_env: String,

    /// Use path-style bucket addressing
    #[serde(default = "default_true")]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_secret_env() -> String {
    "CSCS_S3_SECRET".to_string()
}

impl S3Config {
    pub fn new(endpoint: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: default_region(),
            access_key: access_key.into(),
            secret_env: default_secret_env(),
            path_style: true,
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// `$HBP_ARCHIVE_CONFIG_DIR` takes precedence over the platform config directory.
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("hbp-archive"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade hbp-archive.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        tracing::info!(
            from = config.schema_version,
            to = SCHEMA_VERSION,
            "Migrating configuration"
        );
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.defaults.color, "auto");
        assert!(config.defaults.progress);
        assert_eq!(config.endpoint.backend, BackendKind::Swift);
        assert_eq!(config.endpoint.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.endpoint.password_env, "CSCS_PASS");
        assert_eq!(config.timeout.connect_ms, 5000);
        assert!(config.s3.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.defaults.username = Some("xyzabc".into());
        config.endpoint.backend = BackendKind::S3;
        config.s3 = Some(S3Config::new("https://object.cscs.ch", "AKIA"));

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.defaults.username.as_deref(), Some("xyzabc"));
        assert_eq!(loaded.endpoint.backend, BackendKind::S3);
        assert_eq!(loaded.s3.unwrap().access_key, "AKIA");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (manager, _temp_dir) = temp_config_manager();
        manager.save(&Config::default()).unwrap();
        let mode = std::fs::metadata(manager.config_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            r#"
            schema_version = 1
            [endpoint]
            auth_url = "https://keystone.example/v3"
            "#,
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.endpoint.auth_url, "https://keystone.example/v3");
        assert_eq!(config.endpoint.user_domain, "Default");
        assert_eq!(config.timeout.read_ms, 30000);
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!(
            r#"
            schema_version = {}
            "#,
            SCHEMA_VERSION + 1
        );
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("swift".parse::<BackendKind>().unwrap(), BackendKind::Swift);
        assert_eq!("S3".parse::<BackendKind>().unwrap(), BackendKind::S3);
        assert!("ftp".parse::<BackendKind>().is_err());
    }
}
