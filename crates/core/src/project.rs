//! A project and its storage account

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::traits::{ObjectStore, ProjectInfo};

/// Suffix of the containers Swift uses to keep old object versions
const VERSIONS_SUFFIX: &str = "_versions";

/// A project the user is a member of, scoped to its storage account
#[derive(Clone)]
pub struct Project {
    info: ProjectInfo,
    store: Arc<dyn ObjectStore>,
}

impl Project {
    pub fn new(info: ProjectInfo, store: Arc<dyn ObjectStore>) -> Self {
        Self { info, store }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    fn container(&self, name: impl Into<String>) -> Container {
        Container::new(name, Some(self.info.name.clone()), self.store.clone())
    }

    /// All containers except version archives
    pub async fn containers(&self) -> Result<Vec<Container>> {
        Ok(self
            .container_names()
            .await?
            .into_iter()
            .map(|name| self.container(name))
            .collect())
    }

    /// Names of the containers returned by [`Project::containers`]
    pub async fn container_names(&self) -> Result<Vec<String>> {
        tracing::debug!(project = %self.info.name, "Listing containers");
        Ok(self
            .store
            .list_containers()
            .await?
            .into_iter()
            .map(|c| c.name)
            .filter(|name| !name.ends_with(VERSIONS_SUFFIX))
            .collect())
    }

    /// Look up a container by exact name, version archives included
    pub async fn get_container(&self, name: &str) -> Result<Container> {
        let exists = self
            .store
            .list_containers()
            .await?
            .iter()
            .any(|c| c.name == name);
        if !exists {
            return Err(Error::NotFound(format!(
                "container {name} in project {}",
                self.info.name
            )));
        }
        Ok(self.container(name))
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.name)
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.info.id)
            .field("name", &self.info.name)
            .finish_non_exhaustive()
    }
}
