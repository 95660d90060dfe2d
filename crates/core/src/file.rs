//! A single remote object

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use jiff::Timestamp;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path;
use crate::traits::{ObjectInfo, ObjectStore, ObjectStream};
use crate::units::{SizeUnit, scale_bytes};

/// Content type of pseudo-directory marker objects
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// An object in a container
///
/// The `(container, name)` identity never changes; metadata may be refreshed
/// with [`File::stat`].
#[derive(Clone)]
pub struct File {
    container: String,
    info: ObjectInfo,
    store: Arc<dyn ObjectStore>,
}

impl File {
    pub(crate) fn new(
        container: impl Into<String>,
        info: ObjectInfo,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            container: container.into(),
            info,
            store,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Path of the object inside its container
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn dirname(&self) -> &str {
        path::dirname(&self.info.name)
    }

    pub fn basename(&self) -> &str {
        path::basename(&self.info.name)
    }

    /// Whether this is a pseudo-directory marker rather than file content
    ///
    /// Markers are named with a trailing slash, or carry the
    /// `application/directory` content type.
    pub fn is_directory(&self) -> bool {
        self.info.name.ends_with('/') || self.content_type() == Some(DIRECTORY_CONTENT_TYPE)
    }

    /// Size in bytes, if known
    pub fn bytes(&self) -> Option<u64> {
        self.info.bytes
    }

    pub fn content_type(&self) -> Option<&str> {
        self.info.content_type.as_deref()
    }

    pub fn hash(&self) -> Option<&str> {
        self.info.hash.as_deref()
    }

    pub fn last_modified(&self) -> Option<Timestamp> {
        self.info.last_modified
    }

    pub fn info(&self) -> &ObjectInfo {
        &self.info
    }

    fn display_path(&self) -> String {
        format!("{}/{}", self.container, self.info.name)
    }

    /// Refresh metadata from the backend
    pub async fn stat(&mut self) -> Result<&ObjectInfo> {
        let info = self.store.stat_object(&self.container, &self.info.name).await?;
        self.info.bytes = info.bytes;
        self.info.content_type = info.content_type;
        self.info.hash = info.hash;
        self.info.last_modified = info.last_modified;
        Ok(&self.info)
    }

    /// Size converted to `unit`, fetching metadata first if the size is unknown
    pub async fn size(&mut self, unit: SizeUnit) -> Result<f64> {
        if self.info.bytes.is_none() {
            self.stat().await?;
        }
        let bytes = self.info.bytes.ok_or_else(|| {
            Error::General(format!("backend reported no size for {}", self.display_path()))
        })?;
        Ok(scale_bytes(bytes, unit))
    }

    /// Fetch the full content
    pub async fn read(&self) -> Result<Bytes> {
        self.store.get_object(&self.container, &self.info.name).await
    }

    /// Stream the content without loading it into memory
    pub async fn open(&self) -> Result<ObjectStream> {
        self.store.open_object(&self.container, &self.info.name).await
    }

    /// Write the content to `target`
    ///
    /// Fails with [`Error::FileExists`] when `target` exists and `overwrite`
    /// is false; the existing file is left untouched. Parent directories are
    /// created. Data goes to a `.part` sibling first and is renamed into place
    /// once complete.
    pub async fn download(&self, target: &Path, overwrite: bool) -> Result<PathBuf> {
        let exists = tokio::fs::try_exists(target)
            .await
            .map_err(Error::local_io("check", target))?;
        if exists && !overwrite {
            return Err(Error::FileExists(target.to_path_buf()));
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Error::local_io("create directory", parent))?;
        }

        let partial = partial_path(target);
        let result = self.write_to(&partial).await;
        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, target)
            .await
            .map_err(Error::local_io("rename into place", target))?;

        tracing::debug!(object = %self.display_path(), target = %target.display(), "Downloaded");
        Ok(target.to_path_buf())
    }

    async fn write_to(&self, partial: &Path) -> Result<u64> {
        let mut stream = self.open().await?;
        let mut out = tokio::fs::File::create(partial)
            .await
            .map_err(Error::local_io("create", partial))?;
        let written = stream.copy_to(&mut out).await.map_err(|e| match e {
            Error::Io(io) => Error::local_io("write", partial)(io),
            other => other,
        })?;
        out.sync_all().await.map_err(Error::local_io("sync", partial))?;
        Ok(written)
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.name)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("container", &self.container)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Serialize for File {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            container: &'a str,
            #[serde(flatten)]
            info: &'a ObjectInfo,
        }
        Repr {
            container: &self.container,
            info: &self.info,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn demo_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new("acct"));
        store.create_container("demo").await;
        store.insert("demo", "sub/b.txt", vec![7u8; 2048]).await;
        store
    }

    fn file(store: &Arc<MemoryStore>, name: &str) -> File {
        File::new("demo", ObjectInfo::unknown(name), store.clone())
    }

    #[tokio::test]
    async fn test_size_stats_when_unknown() {
        let store = demo_store().await;
        let mut f = file(&store, "sub/b.txt");
        assert!(f.bytes().is_none());
        assert_eq!(f.size(SizeUnit::KB).await.unwrap(), 2.0);
        assert_eq!(f.bytes(), Some(2048));
    }

    #[tokio::test]
    async fn test_names() {
        let store = demo_store().await;
        let f = file(&store, "sub/b.txt");
        assert_eq!(f.dirname(), "sub");
        assert_eq!(f.basename(), "b.txt");
        assert_eq!(f.to_string(), "sub/b.txt");
    }

    #[tokio::test]
    async fn test_read_and_open_agree() {
        let store = demo_store().await;
        let f = file(&store, "sub/b.txt");
        let direct = f.read().await.unwrap();
        let streamed = f.open().await.unwrap().read_to_end().await.unwrap();
        assert_eq!(direct, streamed);
    }

    #[tokio::test]
    async fn test_download_refuses_existing_without_overwrite() {
        let store = demo_store().await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("b.txt");
        std::fs::write(&target, b"local").unwrap();

        let err = file(&store, "sub/b.txt")
            .download(&target, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileExists(p) if p == target));
        assert_eq!(std::fs::read(&target).unwrap(), b"local");
    }

    #[tokio::test]
    async fn test_download_overwrite_replaces_content() {
        let store = demo_store().await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("b.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"local").unwrap();

        let written = file(&store, "sub/b.txt").download(&target, true).await.unwrap();
        assert_eq!(written, target);
        assert_eq!(std::fs::read(&target).unwrap(), vec![7u8; 2048]);
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_download_missing_object_leaves_nothing() {
        let store = demo_store().await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing.txt");

        let err = file(&store, "missing.txt").download(&target, false).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_download_local_failure_names_path() {
        let store = demo_store().await;
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let target = blocker.join("b.txt");

        let err = file(&store, "sub/b.txt").download(&target, false).await.unwrap_err();
        assert!(
            matches!(err, Error::LocalIo { ref path, .. } if path.starts_with(&blocker)),
            "{err:?}"
        );
        assert!(err.to_string().contains(&blocker.display().to_string()));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_directory_markers() {
        let store = Arc::new(MemoryStore::new("acct"));
        let plain = File::new("demo", ObjectInfo::unknown("sub/b.txt"), store.clone());
        let slash = File::new("demo", ObjectInfo::unknown("sub/"), store.clone());
        let mut typed = ObjectInfo::unknown("sub");
        typed.content_type = Some(DIRECTORY_CONTENT_TYPE.into());
        let typed = File::new("demo", typed, store);

        assert!(!plain.is_directory());
        assert!(slash.is_directory());
        assert!(typed.is_directory());
    }
}
