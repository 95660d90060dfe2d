//! hbp-swift: OpenStack backend for hbp-archive
//!
//! Implements the `Session` and `ObjectStore` traits from hbp-core with
//! Keystone v3 for identity and the Swift REST API for storage, over reqwest.

pub mod auth;
pub mod http;
pub mod session;
pub mod store;

use std::sync::Arc;

use hbp_core::credentials::resolve_password;
use hbp_core::{
    Archive, Config, CredentialSource, Credentials, EnvOrPrompt, PublicContainer, PublicUrl,
    Result, Secret,
};

pub use session::SwiftSession;
pub use store::SwiftStore;

/// Log in with a password and open the user's archive
///
/// `password` wins when given; otherwise `source` is asked, defaulting to the
/// environment variable named in the config with a terminal prompt as
/// fallback.
pub async fn open_archive(
    config: &Config,
    username: &str,
    password: Option<String>,
    source: Option<&dyn CredentialSource>,
) -> Result<Archive> {
    let fallback = EnvOrPrompt::new(config.endpoint.password_env.clone());
    let source = source.unwrap_or(&fallback);
    let password = resolve_password(username, password, source)?;
    let credentials =
        Credentials::with_password(username, password, config.endpoint.auth_url.clone())?
            .user_domain(config.endpoint.user_domain.clone());
    connect(config, &credentials).await
}

/// Open the archive with an already issued Keystone token
pub async fn open_archive_with_token(
    config: &Config,
    username: &str,
    token: Secret,
) -> Result<Archive> {
    let credentials = Credentials::with_token(username, token, config.endpoint.auth_url.clone())?
        .user_domain(config.endpoint.user_domain.clone());
    connect(config, &credentials).await
}

async fn connect(config: &Config, credentials: &Credentials) -> Result<Archive> {
    let client = http::client(&config.timeout)?;
    let session = SwiftSession::connect(client, credentials, &config.endpoint).await?;
    Ok(Archive::new(Arc::new(session)))
}

/// Open a world-readable container from its URL, without credentials
pub fn open_public_container(url: &str, config: &Config) -> Result<PublicContainer> {
    let url = PublicUrl::parse(url)?;
    let client = http::client(&config.timeout)?;
    let store = SwiftStore::public(client, &url.storage_url)?;
    Ok(PublicContainer::with_store(url, Arc::new(store)))
}
