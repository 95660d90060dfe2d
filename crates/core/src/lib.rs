//! hbp-core: object storage client library
//!
//! This crate provides the data model of the hbp archive client:
//! - File, Container, PublicContainer, Project and Archive
//! - Credential resolution and configuration
//! - `Session` and `ObjectStore` traits implemented by the backend adapters
//! - An in-memory backend for tests
//!
//! It does not depend on any HTTP client or storage SDK; see the `hbp-swift`
//! and `hbp-s3` crates for the network backends.

pub mod archive;
pub mod config;
pub mod container;
pub mod credentials;
pub mod error;
pub mod file;
pub mod memory;
pub mod path;
pub mod project;
pub mod public;
pub mod traits;
pub mod units;

pub use archive::Archive;
pub use config::{BackendKind, Config, ConfigManager};
pub use container::{Access, Container, DownloadReport, MoveOptions};
pub use credentials::{AuthMethod, CredentialSource, Credentials, EnvOrPrompt, Secret};
pub use error::{Error, Result};
pub use file::File;
pub use path::{PublicUrl, RemotePath};
pub use project::Project;
pub use public::PublicContainer;
pub use traits::{
    AccessControl, ContainerStats, ContainerSummary, ObjectInfo, ObjectStore, ObjectStream,
    ProjectInfo, Session,
};
pub use units::{SizeUnit, format_size, scale_bytes};
