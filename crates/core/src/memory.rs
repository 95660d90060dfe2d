//! In-memory backend
//!
//! Implements `Session` and `ObjectStore` over process memory. Used by the
//! test suites and usable by downstream crates that need a fake store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::traits::{
    AccessControl, ContainerStats, ContainerSummary, ObjectInfo, ObjectStore, ObjectStream,
    ProjectInfo, Session,
};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: Timestamp,
}

impl StoredObject {
    fn info(&self, name: &str) -> ObjectInfo {
        ObjectInfo {
            name: name.to_string(),
            bytes: Some(self.data.len() as u64),
            content_type: self.content_type.clone(),
            hash: None,
            last_modified: Some(self.last_modified),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryContainer {
    objects: BTreeMap<String, StoredObject>,
    acl: AccessControl,
}

#[derive(Debug, Default)]
struct State {
    containers: BTreeMap<String, MemoryContainer>,
    fail_deletes: bool,
}

/// A storage account held in memory
#[derive(Debug)]
pub struct MemoryStore {
    account: String,
    read_only: bool,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            read_only: false,
            state: Mutex::new(State::default()),
        }
    }

    /// A store that refuses every mutation, like anonymous public access
    pub fn public(account: impl Into<String>) -> Self {
        Self {
            read_only: true,
            ..Self::new(account)
        }
    }

    pub async fn create_container(&self, name: &str) {
        self.state
            .lock()
            .await
            .containers
            .entry(name.to_string())
            .or_default();
    }

    /// Store an object, creating the container if needed
    pub async fn insert(&self, container: &str, path: &str, data: impl Into<Bytes>) {
        let mut state = self.state.lock().await;
        state
            .containers
            .entry(container.to_string())
            .or_default()
            .objects
            .insert(
                path.to_string(),
                StoredObject {
                    data: data.into(),
                    content_type: None,
                    last_modified: Timestamp::now(),
                },
            );
    }

    pub async fn set_access_control(&self, container: &str, acl: AccessControl) {
        let mut state = self.state.lock().await;
        let entry = state.containers.entry(container.to_string()).or_default();
        entry.acl = acl;
    }

    /// Make every subsequent delete fail with a transport error
    pub async fn fail_deletes(&self, fail: bool) {
        self.state.lock().await.fail_deletes = fail;
    }

    /// Whether `container/path` currently exists
    pub async fn contains(&self, container: &str, path: &str) -> bool {
        self.state
            .lock()
            .await
            .containers
            .get(container)
            .is_some_and(|c| c.objects.contains_key(path))
    }

    fn ensure_writable(&self, op: &str, target: &str) -> Result<()> {
        if self.read_only {
            return Err(Error::Permission(format!("{op} {target}: read-only account")));
        }
        Ok(())
    }
}

fn missing_container(container: &str) -> Error {
    Error::NotFound(format!("container {container}"))
}

fn missing_object(container: &str, path: &str) -> Error {
    Error::NotFound(format!("{container}/{path}"))
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn account(&self) -> &str {
        &self.account
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let state = self.state.lock().await;
        Ok(state
            .containers
            .iter()
            .map(|(name, c)| ContainerSummary {
                name: name.clone(),
                count: c.objects.len() as u64,
                bytes: c.objects.values().map(|o| o.data.len() as u64).sum(),
            })
            .collect())
    }

    async fn container_stats(&self, container: &str) -> Result<ContainerStats> {
        let state = self.state.lock().await;
        let c = state
            .containers
            .get(container)
            .ok_or_else(|| missing_container(container))?;
        Ok(ContainerStats {
            object_count: c.objects.len() as u64,
            bytes_used: c.objects.values().map(|o| o.data.len() as u64).sum(),
        })
    }

    async fn list_objects(&self, container: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let state = self.state.lock().await;
        let c = state
            .containers
            .get(container)
            .ok_or_else(|| missing_container(container))?;
        let prefix = prefix.unwrap_or("");
        Ok(c.objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, o)| o.info(name))
            .collect())
    }

    async fn stat_object(&self, container: &str, path: &str) -> Result<ObjectInfo> {
        let state = self.state.lock().await;
        state
            .containers
            .get(container)
            .ok_or_else(|| missing_container(container))?
            .objects
            .get(path)
            .map(|o| o.info(path))
            .ok_or_else(|| missing_object(container, path))
    }

    async fn get_object(&self, container: &str, path: &str) -> Result<Bytes> {
        let state = self.state.lock().await;
        state
            .containers
            .get(container)
            .ok_or_else(|| missing_container(container))?
            .objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| missing_object(container, path))
    }

    async fn open_object(&self, container: &str, path: &str) -> Result<ObjectStream> {
        let data = self.get_object(container, path).await?;
        Ok(ObjectStream::from_bytes(path, data))
    }

    async fn put_object(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        self.ensure_writable("put_object", &format!("{container}/{path}"))?;
        let mut state = self.state.lock().await;
        let c = state
            .containers
            .get_mut(container)
            .ok_or_else(|| missing_container(container))?;
        let object = StoredObject {
            data,
            content_type: content_type.map(String::from),
            last_modified: Timestamp::now(),
        };
        let info = object.info(path);
        c.objects.insert(path.to_string(), object);
        Ok(info)
    }

    async fn delete_object(&self, container: &str, path: &str) -> Result<()> {
        self.ensure_writable("delete_object", &format!("{container}/{path}"))?;
        let mut state = self.state.lock().await;
        if state.fail_deletes {
            return Err(Error::transport(
                "delete_object",
                format!("{container}/{path}"),
                "injected failure",
            ));
        }
        state
            .containers
            .get_mut(container)
            .ok_or_else(|| missing_container(container))?
            .objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| missing_object(container, path))
    }

    async fn copy_object(
        &self,
        container: &str,
        src: &str,
        dest_container: &str,
        dest: &str,
    ) -> Result<()> {
        self.ensure_writable("copy_object", &format!("{dest_container}/{dest}"))?;
        let mut state = self.state.lock().await;
        let object = state
            .containers
            .get(container)
            .ok_or_else(|| missing_container(container))?
            .objects
            .get(src)
            .cloned()
            .ok_or_else(|| missing_object(container, src))?;
        state
            .containers
            .get_mut(dest_container)
            .ok_or_else(|| missing_container(dest_container))?
            .objects
            .insert(
                dest.to_string(),
                StoredObject {
                    last_modified: Timestamp::now(),
                    ..object
                },
            );
        Ok(())
    }

    async fn access_control(&self, container: &str) -> Result<AccessControl> {
        let state = self.state.lock().await;
        state
            .containers
            .get(container)
            .map(|c| c.acl.clone())
            .ok_or_else(|| missing_container(container))
    }
}

/// An identity with a fixed list of projects
#[derive(Debug, Clone)]
pub struct MemorySession {
    username: String,
    projects: Vec<(ProjectInfo, Option<Arc<MemoryStore>>)>,
}

impl MemorySession {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            projects: Vec::new(),
        }
    }

    /// Add a project backed by `store`; enumeration follows insertion order
    pub fn with_project(mut self, name: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        let name = name.into();
        let id = format!("{:032x}", self.projects.len() + 1);
        self.projects.push((ProjectInfo::new(id, name), Some(store)));
        self
    }

    /// Add a project the user is listed in but may not open
    pub fn with_forbidden_project(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = format!("{:032x}", self.projects.len() + 1);
        self.projects.push((ProjectInfo::new(id, name), None));
        self
    }
}

#[async_trait]
impl Session for MemorySession {
    fn username(&self) -> &str {
        &self.username
    }

    async fn list_projects(&self) -> Result<Vec<ProjectInfo>> {
        Ok(self.projects.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn scope(&self, project: &ProjectInfo) -> Result<Arc<dyn ObjectStore>> {
        let (_, store) = self
            .projects
            .iter()
            .find(|(p, _)| p.id == project.id)
            .ok_or_else(|| Error::NotFound(format!("project {}", project.name)))?;
        store
            .clone()
            .map(|store| store as Arc<dyn ObjectStore>)
            .ok_or_else(|| {
                Error::Permission(format!("project {}: no role on project", project.name))
            })
    }
}
