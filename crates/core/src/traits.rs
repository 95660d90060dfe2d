//! Backend traits
//!
//! `Session` is an authenticated identity that can enumerate projects and
//! open a project-scoped `ObjectStore`. `ObjectStore` is one storage account
//! and exposes the object primitives the rest of the crate is built on.
//! Both are implemented by the SDK adapter crates and by `memory` for tests.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Metadata for one stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object path inside its container
    pub name: String,

    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Content hash reported by the backend (MD5 etag for Swift)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo with a known size
    pub fn new(name: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            bytes: Some(bytes),
            content_type: None,
            hash: None,
            last_modified: None,
        }
    }

    /// Create an ObjectInfo whose metadata has not been fetched yet
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: None,
            content_type: None,
            hash: None,
            last_modified: None,
        }
    }
}

/// One entry of an account listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
}

/// Totals kept by the backend in container metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub object_count: u64,
    pub bytes_used: u64,
}

/// Container read/write ACLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

impl AccessControl {
    /// Parse comma-separated ACL header values
    pub fn from_headers(read: Option<&str>, write: Option<&str>) -> Self {
        fn split(value: Option<&str>) -> Vec<String> {
            value
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default()
        }
        Self {
            read: split(read),
            write: split(write),
        }
    }
}

/// A project visible to the authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

impl ProjectInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Boxed stream of object chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Lazily read object content
///
/// The underlying connection is owned by the stream and released when it is
/// dropped, whether or not it was read to the end.
pub struct ObjectStream {
    name: String,
    content_length: Option<u64>,
    inner: ByteStream,
}

impl ObjectStream {
    pub fn new(name: impl Into<String>, content_length: Option<u64>, inner: ByteStream) -> Self {
        Self {
            name: name.into(),
            content_length,
            inner,
        }
    }

    /// Wrap an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, data: Bytes) -> Self {
        let len = data.len() as u64;
        Self::new(
            name,
            Some(len),
            futures::stream::once(async move { Ok(data) }).boxed(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size announced by the backend, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Next chunk, or `None` at end of object
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        self.inner.next().await
    }

    /// Drain the stream into memory
    pub async fn read_to_end(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.content_length.unwrap_or(0) as usize);
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Copy the remaining content into `writer`, returning the byte count
    pub async fn copy_to<W>(&mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.inner.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

impl Stream for ObjectStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("name", &self.name)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// An authenticated identity
#[async_trait]
pub trait Session: Send + Sync {
    /// Username the session was opened for
    fn username(&self) -> &str;

    /// Projects visible to this identity, in backend order
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>>;

    /// Open the storage account of `project`
    async fn scope(&self, project: &ProjectInfo) -> Result<Arc<dyn ObjectStore>>;
}

/// Object operations on one storage account
///
/// This trait is implemented by the backend adapters and can be faked for testing.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Identifier of the storage account; equal values allow server-side copies
    fn account(&self) -> &str;

    /// Whether mutating calls are refused up front (public access)
    fn read_only(&self) -> bool {
        false
    }

    /// List containers in the account
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;

    /// Object count and bytes used, from container metadata
    async fn container_stats(&self, container: &str) -> Result<ContainerStats>;

    /// List objects, optionally restricted to names starting with `prefix`
    async fn list_objects(&self, container: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>>;

    /// Get object metadata
    async fn stat_object(&self, container: &str, path: &str) -> Result<ObjectInfo>;

    /// Get object content as bytes
    async fn get_object(&self, container: &str, path: &str) -> Result<Bytes>;

    /// Get object content as a stream
    async fn open_object(&self, container: &str, path: &str) -> Result<ObjectStream>;

    /// Create or replace an object
    async fn put_object(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo>;

    /// Delete an object
    async fn delete_object(&self, container: &str, path: &str) -> Result<()>;

    /// Server-side copy within this account
    async fn copy_object(
        &self,
        container: &str,
        src: &str,
        dest_container: &str,
        dest: &str,
    ) -> Result<()>;

    /// Container ACLs
    async fn access_control(&self, container: &str) -> Result<AccessControl>;
}
