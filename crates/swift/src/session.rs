//! Keystone session: one authenticated user, many project accounts

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use hbp_core::config::EndpointConfig;
use hbp_core::{Credentials, Error, ObjectStore, ProjectInfo, Result, Secret, Session};

use crate::auth::Keystone;
use crate::store::SwiftStore;

/// Storage URL of a project when the catalog is bypassed
fn storage_url_for(root: &str, project_id: &str) -> String {
    format!("{}/AUTH_{}", root.trim_end_matches('/'), project_id)
}

/// An authenticated Keystone user
///
/// Holds the unscoped token; each call to `scope` obtains a project-scoped
/// token and opens that project's Swift account.
pub struct SwiftSession {
    keystone: Keystone,
    client: Client,
    username: String,
    token: Secret,
    interface: String,
    storage_root: Option<String>,
}

impl SwiftSession {
    /// Authenticate `credentials` against `credentials.auth_url`
    pub async fn connect(
        client: Client,
        credentials: &Credentials,
        endpoint: &EndpointConfig,
    ) -> Result<Self> {
        let keystone = Keystone::new(client.clone(), credentials.auth_url.clone());
        let token = keystone.authenticate(credentials).await?;
        let username = token
            .user
            .clone()
            .unwrap_or_else(|| credentials.username.clone());
        tracing::info!(user = %username, "Authenticated");

        Ok(Self {
            keystone,
            client,
            username,
            token: token.id,
            interface: endpoint.interface.clone(),
            storage_root: endpoint.storage_url.clone(),
        })
    }
}

#[async_trait]
impl Session for SwiftSession {
    fn username(&self) -> &str {
        &self.username
    }

    async fn list_projects(&self) -> Result<Vec<ProjectInfo>> {
        self.keystone.projects(&self.token).await
    }

    async fn scope(&self, project: &ProjectInfo) -> Result<Arc<dyn ObjectStore>> {
        let scoped = self.keystone.scope(&self.token, &project.id).await?;
        let storage_url = match &self.storage_root {
            Some(root) => storage_url_for(root, &project.id),
            None => scoped
                .object_store_url(&self.interface)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "{} object-store endpoint for project {}",
                        self.interface, project.name
                    ))
                })?,
        };
        tracing::debug!(project = %project.name, %storage_url, "Opened project account");
        let store = SwiftStore::new(self.client.clone(), &storage_url, scoped.id)?;
        Ok(Arc::new(store) as Arc<dyn ObjectStore>)
    }
}
