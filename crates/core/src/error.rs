//! Error types for hbp-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for hbp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for hbp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid remote or local path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Unknown size unit
    #[error("Invalid unit '{0}': expected one of B, KB, MB, GB, TB")]
    InvalidUnit(String),

    /// Malformed public container URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local filesystem failure while reading or writing a named path
    #[error("{op} {}: {source}", .path.display())]
    LocalIo {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Container, object or project does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutating operation on a read-only scope, or refused by the backend
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Local file already exists and overwriting was not requested
    #[error("File exists: {}", .0.display())]
    FileExists(PathBuf),

    /// Network or backend failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Move copied the object but could not remove the source
    #[error("Partial failure: copied {from} to {to} but could not delete the source: {reason}")]
    PartialFailure {
        from: String,
        to: String,
        reason: String,
    },

    /// Feature not supported by backend
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Build a transport error naming the failed operation and its target
    pub fn transport(
        op: &str,
        target: impl std::fmt::Display,
        cause: impl std::fmt::Display,
    ) -> Self {
        Error::Transport(format!("{op} {target}: {cause}"))
    }

    /// Wrap an I/O error from `op` on `path`, for use with `map_err`
    pub fn local_io<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Error + 'a {
        move |source| Error::LocalIo {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::InvalidUnit(_) => 2, // UsageError
            Error::InvalidUrl(_) | Error::Url(_) => 2,          // UsageError
            Error::Config(_) => 2,                              // UsageError
            Error::Transport(_) => 3,                           // NetworkError
            Error::Auth(_) | Error::Permission(_) => 4,         // AuthError
            Error::NotFound(_) => 5,                            // NotFound
            Error::FileExists(_) => 6,                          // Conflict
            Error::UnsupportedFeature(_) => 7,                  // UnsupportedFeature
            Error::PartialFailure { .. } => 8,                  // PartialFailure
            _ => 1,                                             // GeneralError
        }
    }
}
