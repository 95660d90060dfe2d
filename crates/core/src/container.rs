//! Operations over a single named container
//!
//! Nothing is cached: every list, count or size call asks the backend again.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::file::File;
use crate::path::{self, basename, dirname, join_key};
use crate::traits::{AccessControl, ContainerStats, ObjectStore, ObjectStream};
use crate::units::{SizeUnit, scale_bytes};

/// Whether a container accepts mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

/// Outcome of a whole-container download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Files written
    pub downloaded: Vec<PathBuf>,
    /// Files left alone because they already existed locally
    pub skipped: Vec<PathBuf>,
}

/// Where `Container::move_to` puts the object
///
/// Unset fields keep the source's value: same container, same directory,
/// same file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveOptions<'a> {
    pub container: Option<&'a Container>,
    pub directory: Option<&'a str>,
    pub new_name: Option<&'a str>,
}

impl<'a> MoveOptions<'a> {
    pub fn to_container(mut self, container: &'a Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn to_directory(mut self, directory: &'a str) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn renamed(mut self, new_name: &'a str) -> Self {
        self.new_name = Some(new_name);
        self
    }
}

/// A named container inside a project (or a public account)
#[derive(Clone)]
pub struct Container {
    name: String,
    project: Option<String>,
    access: Access,
    store: Arc<dyn ObjectStore>,
}

impl Container {
    /// Handle on `name` in `store`
    ///
    /// The handle is read-only if the store refuses mutations.
    pub fn new(
        name: impl Into<String>,
        project: Option<String>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let access = if store.read_only() {
            Access::ReadOnly
        } else {
            Access::ReadWrite
        };
        Self {
            name: name.into(),
            project,
            access,
            store,
        }
    }

    /// Same container, refusing mutations regardless of backend permissions
    pub fn into_read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning project; `None` for public containers
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn describe(&self, path: &str) -> String {
        format!("{}/{}", self.name, path)
    }

    fn ensure_writable(&self, op: &str, path: &str) -> Result<()> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(Error::Permission(format!(
                "{op} {}: container is read-only",
                self.describe(path)
            ))),
        }
    }

    /// Objects whose names start with `prefix`, in backend order
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<File>> {
        tracing::debug!(container = %self.name, ?prefix, "Listing objects");
        let infos = self.store.list_objects(&self.name, prefix).await?;
        Ok(infos
            .into_iter()
            .map(|info| File::new(self.name.clone(), info, self.store.clone()))
            .collect())
    }

    /// Number of objects matching `prefix`; always equal to `list(prefix).len()`
    pub async fn count(&self, prefix: Option<&str>) -> Result<usize> {
        Ok(self.list(prefix).await?.len())
    }

    /// Total size of the objects matching `prefix`, in `unit`
    pub async fn size(&self, unit: SizeUnit, prefix: Option<&str>) -> Result<f64> {
        let total: u64 = self
            .store
            .list_objects(&self.name, prefix)
            .await?
            .iter()
            .filter_map(|o| o.bytes)
            .sum();
        Ok(scale_bytes(total, unit))
    }

    /// Object count and bytes used as recorded in container metadata
    ///
    /// One request regardless of container size, but may lag behind `list`.
    pub async fn stats(&self) -> Result<ContainerStats> {
        self.store.container_stats(&self.name).await
    }

    /// Read and write ACLs
    pub async fn access_control(&self) -> Result<AccessControl> {
        self.store.access_control(&self.name).await
    }

    /// Handle on one object, with fresh metadata
    pub async fn get(&self, path: &str) -> Result<File> {
        let info = self.store.stat_object(&self.name, path).await?;
        Ok(File::new(self.name.clone(), info, self.store.clone()))
    }

    /// Full content of one object
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        self.store.get_object(&self.name, path).await
    }

    /// Stream one object; the connection is released when the stream is dropped
    pub async fn open(&self, path: &str) -> Result<ObjectStream> {
        self.store.open_object(&self.name, path).await
    }

    /// Download one object to `target_dir`, recreating its remote directories
    ///
    /// Fails with [`Error::FileExists`] if the local file exists and
    /// `overwrite` is false.
    pub async fn download(
        &self,
        path: &str,
        target_dir: &Path,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let target = path::local_path(target_dir, path)?;
        let file = File::new(
            self.name.clone(),
            crate::traits::ObjectInfo::unknown(path),
            self.store.clone(),
        );
        file.download(&target, overwrite).await
    }

    /// Download every object to `target_dir`
    ///
    /// Existing local files are skipped unless `overwrite` is set; skipped
    /// paths are listed in the report.
    pub async fn download_all(&self, target_dir: &Path, overwrite: bool) -> Result<DownloadReport> {
        self.download_matching(None, target_dir, overwrite, |_| {})
            .await
    }

    /// Download every object matching `prefix` to `target_dir`
    ///
    /// Pseudo-directory markers become local directories and are not
    /// reported. `on_file` is called after each object has been written or
    /// skipped.
    pub async fn download_matching(
        &self,
        prefix: Option<&str>,
        target_dir: &Path,
        overwrite: bool,
        mut on_file: impl FnMut(&File),
    ) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();
        for file in self.list(prefix).await? {
            let target = path::local_path(target_dir, file.name())?;
            if file.is_directory() {
                tokio::fs::create_dir_all(&target)
                    .await
                    .map_err(Error::local_io("create directory", &target))?;
                continue;
            }
            match file.download(&target, overwrite).await {
                Ok(written) => report.downloaded.push(written),
                Err(Error::FileExists(existing)) => {
                    tracing::warn!(path = %existing.display(), "Skipping existing file");
                    report.skipped.push(existing);
                }
                Err(e) => return Err(e),
            }
            on_file(&file);
        }
        tracing::info!(
            container = %self.name,
            ?prefix,
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            "Container downloaded"
        );
        Ok(report)
    }

    /// Upload a local file to `remote_path`
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<File> {
        self.ensure_writable("upload", remote_path)?;
        let data = tokio::fs::read(local_path)
            .await
            .map_err(Error::local_io("read", local_path))?;
        let content_type = mime_guess::from_path(local_path)
            .first()
            .map(|m| m.essence_str().to_string());
        let info = self
            .store
            .put_object(
                &self.name,
                remote_path,
                Bytes::from(data),
                content_type.as_deref(),
            )
            .await?;
        tracing::info!(
            source = %local_path.display(),
            target = %self.describe(remote_path),
            "Uploaded"
        );
        Ok(File::new(self.name.clone(), info, self.store.clone()))
    }

    /// Upload in-memory data to `remote_path`
    pub async fn put(
        &self,
        remote_path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<File> {
        self.ensure_writable("put", remote_path)?;
        let info = self
            .store
            .put_object(&self.name, remote_path, data, content_type)
            .await?;
        Ok(File::new(self.name.clone(), info, self.store.clone()))
    }

    /// Delete one object
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.ensure_writable("delete", path)?;
        self.store.delete_object(&self.name, path).await?;
        tracing::info!(object = %self.describe(path), "Deleted");
        Ok(())
    }

    /// Rename an object in place
    pub async fn rename(&self, path: &str, new_name: &str) -> Result<File> {
        self.move_to(path, MoveOptions::default().renamed(new_name))
            .await
    }

    /// Move an object: copy it to the destination, then delete the source
    ///
    /// Not atomic. If the copy succeeds and the delete fails, the object exists
    /// in both places and [`Error::PartialFailure`] is returned.
    pub async fn move_to(&self, path: &str, options: MoveOptions<'_>) -> Result<File> {
        let dest_container = options.container.unwrap_or(self);
        let directory = options.directory.unwrap_or_else(|| dirname(path));
        let name = options.new_name.unwrap_or_else(|| basename(path));
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidPath(format!("invalid object name '{name}'")));
        }
        let dest_path = join_key(directory, name);

        let from = self.describe(path);
        let to = dest_container.describe(&dest_path);
        if from == to && self.store.account() == dest_container.store.account() {
            return Err(Error::InvalidPath(format!(
                "source and destination are both {from}"
            )));
        }

        self.ensure_writable("move", path)?;
        dest_container.ensure_writable("move", &dest_path)?;

        if self.store.account() == dest_container.store.account() {
            self.store
                .copy_object(&self.name, path, &dest_container.name, &dest_path)
                .await?;
        } else {
            let stat = self.store.stat_object(&self.name, path).await?;
            let data = self.store.get_object(&self.name, path).await?;
            dest_container
                .store
                .put_object(
                    &dest_container.name,
                    &dest_path,
                    data,
                    stat.content_type.as_deref(),
                )
                .await?;
        }

        if let Err(e) = self.store.delete_object(&self.name, path).await {
            tracing::warn!(%from, %to, error = %e, "Copied but failed to delete source");
            return Err(Error::PartialFailure {
                from,
                to,
                reason: e.to_string(),
            });
        }

        tracing::info!(%from, %to, "Moved");
        dest_container.get(&dest_path).await
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{}/{}", project, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("project", &self.project)
            .field("access", &self.access)
            .field("account", &self.store.account())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn demo() -> (Container, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("acct"));
        store.insert("demo", "a.txt", vec![1u8; 10]).await;
        store.insert("demo", "sub/b.txt", vec![2u8; 2048]).await;
        store.create_container("other").await;
        (Container::new("demo", Some("proj".into()), store.clone()), store)
    }

    #[tokio::test]
    async fn test_example_scenario() {
        let (c, _) = demo().await;
        let files = c.list(None).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(c.count(None).await.unwrap(), 2);
        assert_eq!(c.size(SizeUnit::KB, None).await.unwrap(), 2058.0 / 1024.0);
        assert_eq!(c.size(SizeUnit::KB, Some("sub")).await.unwrap(), 2.0);
        assert_eq!(c.size(SizeUnit::Bytes, None).await.unwrap(), 2058.0);
    }

    #[tokio::test]
    async fn test_count_matches_list() {
        let (c, _) = demo().await;
        for prefix in [None, Some(""), Some("sub"), Some("a"), Some("nothing-here")] {
            let listed = c.list(prefix).await.unwrap().len();
            assert_eq!(c.count(prefix).await.unwrap(), listed, "prefix {prefix:?}");
        }
        assert_eq!(c.count(Some("nothing-here")).await.unwrap(), 0);
        assert!(c.list(Some("nothing-here")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_and_display() {
        let (c, _) = demo().await;
        let stats = c.stats().await.unwrap();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.bytes_used, 2058);
        assert_eq!(c.to_string(), "proj/demo");
    }

    #[tokio::test]
    async fn test_read_get_and_missing() {
        let (c, _) = demo().await;
        assert_eq!(c.read("a.txt").await.unwrap().len(), 10);
        let f = c.get("sub/b.txt").await.unwrap();
        assert_eq!(f.bytes(), Some(2048));
        assert_eq!(f.read().await.unwrap(), c.read("sub/b.txt").await.unwrap());
        assert!(matches!(c.read("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_preserves_structure() {
        let (c, _) = demo().await;
        let dir = tempfile::tempdir().unwrap();
        let local = c.download("sub/b.txt", dir.path(), false).await.unwrap();
        assert_eq!(local, dir.path().join("sub").join("b.txt"));
        assert_eq!(std::fs::read(&local).unwrap().len(), 2048);

        let err = c.download("sub/b.txt", dir.path(), false).await.unwrap_err();
        assert!(matches!(err, Error::FileExists(_)));
    }

    #[tokio::test]
    async fn test_download_all_reports_skipped() {
        let (c, _) = demo().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"keep me").unwrap();

        let report = c.download_all(dir.path(), false).await.unwrap();
        assert_eq!(
            report.downloaded,
            vec![dir.path().join("sub").join("b.txt")]
        );
        assert_eq!(report.skipped, vec![dir.path().join("a.txt")]);
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"keep me");

        let report = c.download_all(dir.path(), true).await.unwrap();
        assert_eq!(report.downloaded.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(
            std::fs::read(dir.path().join("a.txt")).unwrap(),
            vec![1u8; 10]
        );
    }

    #[tokio::test]
    async fn test_download_all_creates_directory_markers() {
        let store = Arc::new(MemoryStore::new("acct"));
        store.insert("demo", "sub/", Vec::<u8>::new()).await;
        store.insert("demo", "sub/b.txt", vec![2u8; 16]).await;
        store.insert("demo", "empty/", Vec::<u8>::new()).await;
        let c = Container::new("demo", None, store);
        let dir = tempfile::tempdir().unwrap();

        let report = c.download_all(dir.path(), false).await.unwrap();
        assert_eq!(
            report.downloaded,
            vec![dir.path().join("sub").join("b.txt")]
        );
        assert!(report.skipped.is_empty());
        assert!(dir.path().join("sub").is_dir());
        assert!(dir.path().join("empty").is_dir());
        assert_eq!(
            std::fs::read(dir.path().join("sub/b.txt")).unwrap(),
            vec![2u8; 16]
        );

        let again = c.download_all(dir.path(), false).await.unwrap();
        assert!(again.downloaded.is_empty());
        assert_eq!(again.skipped, vec![dir.path().join("sub").join("b.txt")]);
    }

    #[tokio::test]
    async fn test_download_matching_prefix_and_callback() {
        let (c, _) = demo().await;
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();

        let report = c
            .download_matching(Some("sub/"), dir.path(), false, |f| {
                seen.push((f.name().to_string(), f.bytes()))
            })
            .await
            .unwrap();
        assert_eq!(
            report.downloaded,
            vec![dir.path().join("sub").join("b.txt")]
        );
        assert_eq!(seen, vec![("sub/b.txt".to_string(), Some(2048))]);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_missing_file_names_path() {
        let (c, _) = demo().await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = c.upload(&missing, "missing.txt").await.unwrap_err();
        assert!(matches!(err, Error::LocalIo { op: "read", .. }), "{err:?}");
        assert!(err.to_string().starts_with(&format!("read {}", missing.display())));
    }

    #[tokio::test]
    async fn test_upload_then_download_round_trip() {
        let (c, _) = demo().await;
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.json");
        std::fs::write(&src, br#"{"k": 1}"#).unwrap();

        let uploaded = c.upload(&src, "docs/notes.json").await.unwrap();
        assert_eq!(uploaded.content_type(), Some("application/json"));
        assert_eq!(uploaded.bytes(), Some(8));

        let out = tempfile::tempdir().unwrap();
        let local = c
            .download("docs/notes.json", out.path(), true)
            .await
            .unwrap();
        assert_eq!(std::fs::read(local).unwrap(), std::fs::read(&src).unwrap());
    }

    #[tokio::test]
    async fn test_move_to_other_container() {
        let (c, store) = demo().await;
        let other = Container::new("other", Some("proj".into()), store.clone());

        let moved = c
            .move_to("sub/b.txt", MoveOptions::default().to_container(&other))
            .await
            .unwrap();
        assert_eq!(moved.container(), "other");
        assert_eq!(moved.name(), "sub/b.txt");
        assert!(!store.contains("demo", "sub/b.txt").await);
        assert_eq!(other.read("sub/b.txt").await.unwrap(), vec![2u8; 2048]);
    }

    #[tokio::test]
    async fn test_move_to_directory_and_rename() {
        let (c, store) = demo().await;
        let moved = c
            .move_to("a.txt", MoveOptions::default().to_directory("archive/"))
            .await
            .unwrap();
        assert_eq!(moved.name(), "archive/a.txt");
        assert!(!store.contains("demo", "a.txt").await);

        let renamed = c.rename("archive/a.txt", "renamed.txt").await.unwrap();
        assert_eq!(renamed.name(), "archive/renamed.txt");
        assert_eq!(c.read("archive/renamed.txt").await.unwrap(), vec![1u8; 10]);
    }

    #[tokio::test]
    async fn test_move_across_accounts_copies_bytes() {
        let (c, store) = demo().await;
        let remote = Arc::new(MemoryStore::new("elsewhere"));
        remote.create_container("dest").await;
        let dest = Container::new("dest", Some("p2".into()), remote.clone());

        c.move_to("a.txt", MoveOptions::default().to_container(&dest))
            .await
            .unwrap();
        assert!(!store.contains("demo", "a.txt").await);
        assert_eq!(dest.read("a.txt").await.unwrap(), vec![1u8; 10]);
    }

    #[tokio::test]
    async fn test_move_partial_failure_keeps_both_copies() {
        let (c, store) = demo().await;
        store.fail_deletes(true).await;

        let err = c
            .move_to("a.txt", MoveOptions::default().to_directory("moved"))
            .await
            .unwrap_err();
        match err {
            Error::PartialFailure { from, to, .. } => {
                assert_eq!(from, "demo/a.txt");
                assert_eq!(to, "demo/moved/a.txt");
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        assert!(store.contains("demo", "a.txt").await);
        assert!(store.contains("demo", "moved/a.txt").await);
    }

    #[tokio::test]
    async fn test_move_missing_source_is_not_found() {
        let (c, _) = demo().await;
        let err = c.rename("ghost.txt", "still-ghost.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_move_onto_itself_rejected() {
        let (c, store) = demo().await;
        let err = c.rename("a.txt", "a.txt").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert!(store.contains("demo", "a.txt").await);
    }

    #[tokio::test]
    async fn test_delete() {
        let (c, store) = demo().await;
        c.delete("a.txt").await.unwrap();
        assert!(!store.contains("demo", "a.txt").await);
        assert!(matches!(c.delete("a.txt").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_only_container_refuses_mutations() {
        let (c, store) = demo().await;
        let ro = c.clone().into_read_only();
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("x.txt");
        std::fs::write(&src, b"x").unwrap();

        assert!(matches!(ro.upload(&src, "x.txt").await, Err(Error::Permission(_))));
        assert!(matches!(ro.delete("a.txt").await, Err(Error::Permission(_))));
        assert!(matches!(ro.rename("a.txt", "b.txt").await, Err(Error::Permission(_))));
        assert!(store.contains("demo", "a.txt").await);
        assert_eq!(ro.count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_access_control() {
        let (c, store) = demo().await;
        assert_eq!(c.access_control().await.unwrap(), AccessControl::default());
        store
            .set_access_control(
                "demo",
                AccessControl::from_headers(Some(".r:*,.rlistings"), None),
            )
            .await;
        assert_eq!(c.access_control().await.unwrap().read.len(), 2);
    }
}
