//! Session over an S3 gateway
//!
//! An S3 key pair grants access to exactly one account, so the session
//! exposes a single project whose containers are the buckets.

use std::sync::Arc;

use async_trait::async_trait;

use hbp_core::credentials::resolve_password;
use hbp_core::{
    Archive, Config, CredentialSource, EnvOrPrompt, Error, ObjectStore, ProjectInfo, Result,
    Session,
};

use crate::client::S3Store;

/// An S3 key pair and the one project it reaches
pub struct S3Session {
    username: String,
    project: ProjectInfo,
    store: Arc<S3Store>,
}

impl S3Session {
    pub fn new(access_key: impl Into<String>, store: S3Store) -> Self {
        let username = access_key.into();
        let name = url::Url::parse(store.account())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| store.account().to_string());
        Self {
            project: ProjectInfo::new(username.clone(), name),
            username,
            store: Arc::new(store),
        }
    }
}

#[async_trait]
impl Session for S3Session {
    fn username(&self) -> &str {
        &self.username
    }

    async fn list_projects(&self) -> Result<Vec<ProjectInfo>> {
        Ok(vec![self.project.clone()])
    }

    async fn scope(&self, project: &ProjectInfo) -> Result<Arc<dyn ObjectStore>> {
        if project.id != self.project.id {
            return Err(Error::NotFound(format!("project {}", project.name)));
        }
        Ok(self.store.clone() as Arc<dyn ObjectStore>)
    }
}

/// Connect to the S3 gateway described by `config`
///
/// The secret key comes from `secret`, else from `source`. Without a source
/// the environment variable named in the config is read, with a terminal
/// prompt as fallback.
pub async fn open_archive(
    config: &Config,
    secret: Option<String>,
    source: Option<&dyn CredentialSource>,
) -> Result<Archive> {
    let s3 = config
        .s3
        .as_ref()
        .ok_or_else(|| Error::Config("backend is s3 but the [s3] section is missing".into()))?;

    let fallback = EnvOrPrompt::new(s3.secret_env.clone());
    let source = source.unwrap_or(&fallback);
    let secret = resolve_password(&s3.access_key, secret, source)?;

    let store = S3Store::connect(s3, &secret, &config.timeout).await?;
    Ok(Archive::new(Arc::new(S3Session::new(s3.access_key.clone(), store))))
}
