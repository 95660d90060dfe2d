//! Entry point for an authenticated user

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::project::Project;
use crate::traits::{ProjectInfo, Session};

/// Everything an authenticated user can reach
///
/// Projects are enumerated on every call, in the order the backend returns
/// them.
#[derive(Clone)]
pub struct Archive {
    session: Arc<dyn Session>,
}

impl Archive {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }

    pub fn username(&self) -> &str {
        self.session.username()
    }

    /// All projects of the user, each scoped to its storage account
    ///
    /// Projects whose storage cannot be opened are skipped with a warning.
    pub async fn projects(&self) -> Result<Vec<Project>> {
        let infos = self.session.list_projects().await?;
        tracing::debug!(count = infos.len(), "Listed projects");
        let mut projects = Vec::with_capacity(infos.len());
        for info in infos {
            if let Some(project) = self.open_or_skip(info).await? {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    /// `None` when the project is listed but its storage is out of reach
    async fn open_or_skip(&self, info: ProjectInfo) -> Result<Option<Project>> {
        match self.session.scope(&info).await {
            Ok(store) => Ok(Some(Project::new(info, store))),
            Err(e @ (Error::Permission(_) | Error::NotFound(_))) => {
                tracing::warn!(project = %info.name, error = %e, "Skipping project");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Project by exact name
    pub async fn project(&self, name: &str) -> Result<Project> {
        let info = self
            .session
            .list_projects()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::NotFound(format!("project {name}")))?;
        let store = self.session.scope(&info).await?;
        Ok(Project::new(info, store))
    }

    /// First container named `name`, searching projects in enumeration order
    ///
    /// Projects whose storage cannot be reached are skipped with a warning.
    pub async fn find_container(&self, name: &str) -> Result<Container> {
        for info in self.session.list_projects().await? {
            let Some(project) = self.open_or_skip(info).await? else {
                continue;
            };
            match project.get_container(name).await {
                Ok(container) => return Ok(container),
                Err(Error::NotFound(_)) => continue,
                Err(e @ Error::Permission(_)) => {
                    tracing::warn!(project = %project.name(), error = %e, "Skipping project");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::NotFound(format!("container {name} in any project")))
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("username", &self.session.username())
            .finish_non_exhaustive()
    }
}
