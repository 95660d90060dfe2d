//! Anonymous read access to a world-readable container

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::container::{Container, DownloadReport};
use crate::error::Result;
use crate::file::File;
use crate::path::PublicUrl;
use crate::traits::{ObjectStore, ObjectStream};
use crate::units::SizeUnit;

/// A container reached through its public URL
///
/// Only read operations are exposed. The underlying [`Container`] is
/// available through [`PublicContainer::as_container`] and refuses every
/// mutation with a permission error.
#[derive(Debug, Clone)]
pub struct PublicContainer {
    url: PublicUrl,
    inner: Container,
}

impl PublicContainer {
    /// Wrap `store`, which must already point at the account in `url`
    pub fn with_store(url: PublicUrl, store: Arc<dyn ObjectStore>) -> Self {
        let inner = Container::new(url.container.clone(), None, store).into_read_only();
        Self { url, inner }
    }

    pub fn url(&self) -> &PublicUrl {
        &self.url
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn as_container(&self) -> &Container {
        &self.inner
    }

    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<File>> {
        self.inner.list(prefix).await
    }

    pub async fn count(&self, prefix: Option<&str>) -> Result<usize> {
        self.inner.count(prefix).await
    }

    pub async fn size(&self, unit: SizeUnit, prefix: Option<&str>) -> Result<f64> {
        self.inner.size(unit, prefix).await
    }

    pub async fn get(&self, path: &str) -> Result<File> {
        self.inner.get(path).await
    }

    pub async fn read(&self, path: &str) -> Result<Bytes> {
        self.inner.read(path).await
    }

    pub async fn open(&self, path: &str) -> Result<ObjectStream> {
        self.inner.open(path).await
    }

    pub async fn download(
        &self,
        path: &str,
        target_dir: &Path,
        overwrite: bool,
    ) -> Result<PathBuf> {
        self.inner.download(path, target_dir, overwrite).await
    }

    pub async fn download_all(&self, target_dir: &Path, overwrite: bool) -> Result<DownloadReport> {
        self.inner.download_all(target_dir, overwrite).await
    }
}

impl fmt::Display for PublicContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}
