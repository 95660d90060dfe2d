//! Swift object storage account
//!
//! One `SwiftStore` talks to one account (`<endpoint>/v1/AUTH_<id>`), either
//! with a project-scoped token or anonymously for public containers.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap, LAST_MODIFIED};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use url::Url;

use hbp_core::{
    AccessControl, ContainerStats, ContainerSummary, Error, ObjectInfo, ObjectStore,
    ObjectStream, Result, Secret,
};

use crate::http::{self, AUTH_TOKEN};

const CONTAINER_OBJECT_COUNT: &str = "X-Container-Object-Count";
const CONTAINER_BYTES_USED: &str = "X-Container-Bytes-Used";
const CONTAINER_READ: &str = "X-Container-Read";
const CONTAINER_WRITE: &str = "X-Container-Write";
const COPY_FROM: &str = "X-Copy-From";

/// Entry of a JSON container listing
#[derive(Debug, Deserialize)]
struct ListedContainer {
    name: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    bytes: u64,
}

/// Entry of a JSON object listing
#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    bytes: Option<u64>,
    content_type: Option<String>,
    hash: Option<String>,
    last_modified: Option<String>,
}

impl ListedObject {
    fn into_info(self) -> ObjectInfo {
        let mut info = ObjectInfo::unknown(self.name);
        info.bytes = self.bytes;
        info.content_type = self.content_type;
        info.hash = self.hash;
        info.last_modified = self.last_modified.as_deref().and_then(parse_listing_time);
        info
    }
}

/// Listing timestamps carry no zone and are UTC, e.g. `2017-05-04T12:34:56.123456`
fn parse_listing_time(value: &str) -> Option<jiff::Timestamp> {
    let dt: jiff::civil::DateTime = value.parse().ok()?;
    dt.to_zoned(jiff::tz::TimeZone::UTC)
        .ok()
        .map(|z| z.timestamp())
}

/// HTTP dates, e.g. `Thu, 04 May 2017 12:34:56 GMT`
fn parse_http_date(value: &str) -> Option<jiff::Timestamp> {
    let dt = jiff::civil::DateTime::strptime("%a, %d %b %Y %H:%M:%S GMT", value).ok()?;
    dt.to_zoned(jiff::tz::TimeZone::UTC)
        .ok()
        .map(|z| z.timestamp())
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header(headers, name).and_then(|v| v.parse().ok())
}

fn object_info(path: &str, headers: &HeaderMap) -> ObjectInfo {
    let mut info = ObjectInfo::unknown(path);
    info.bytes = header_u64(headers, CONTENT_LENGTH.as_str());
    info.content_type = header(headers, CONTENT_TYPE.as_str()).map(str::to_string);
    info.hash = header(headers, ETAG.as_str()).map(|e| e.trim_matches('"').to_string());
    info.last_modified = header(headers, LAST_MODIFIED.as_str()).and_then(parse_http_date);
    info
}

/// A Swift account reachable at `storage_url`
#[derive(Debug, Clone)]
pub struct SwiftStore {
    client: Client,
    storage_url: Url,
    account: String,
    token: Option<Secret>,
}

impl SwiftStore {
    /// Authenticated access with a project-scoped token
    pub fn new(client: Client, storage_url: &str, token: Secret) -> Result<Self> {
        Self::build(client, storage_url, Some(token))
    }

    /// Anonymous access; mutations are refused without a request
    pub fn public(client: Client, storage_url: &str) -> Result<Self> {
        Self::build(client, storage_url, None)
    }

    fn build(client: Client, storage_url: &str, token: Option<Secret>) -> Result<Self> {
        let storage_url = Url::parse(storage_url.trim_end_matches('/'))?;
        let account = storage_url
            .path_segments()
            .and_then(|mut s| s.find(|seg| seg.starts_with("AUTH_")))
            .map(|seg| seg.trim_start_matches("AUTH_").to_string())
            .unwrap_or_else(|| storage_url.to_string());
        Ok(Self {
            client,
            storage_url,
            account,
            token,
        })
    }

    pub fn storage_url(&self) -> &Url {
        &self.storage_url
    }

    /// URL of the account, a container, or an object, each segment escaped
    ///
    /// URL parsing collapses `.` and `..` segments, which would address a
    /// different object, so names containing them are refused.
    fn url(&self, container: Option<&str>, path: Option<&str>) -> Result<Url> {
        let dot_segment = |s: &str| s == "." || s == "..";
        if container.is_some_and(dot_segment)
            || path.is_some_and(|p| p.split('/').any(dot_segment))
        {
            return Err(Error::InvalidPath(format!(
                "{}/{}: '.' and '..' segments cannot be addressed",
                container.unwrap_or_default(),
                path.unwrap_or_default()
            )));
        }
        let mut url = self.storage_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::InvalidUrl(format!("{}: cannot be a base URL", self.storage_url))
            })?;
            segments.pop_if_empty();
            if let Some(container) = container {
                segments.push(container);
            }
            if let Some(path) = path {
                segments.extend(path.split('/'));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(AUTH_TOKEN, token.expose()),
            None => builder,
        }
    }

    fn ensure_writable(&self, op: &str, target: &str) -> Result<()> {
        if self.token.is_none() {
            return Err(Error::Permission(format!("{op} {target}: anonymous access is read-only")));
        }
        Ok(())
    }

    async fn send(
        &self,
        op: &str,
        target: &str,
        builder: RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| http::send_error(op, target, e))?;
        http::check(op, target, response).await
    }

    /// Walk a JSON listing page by page, following `marker`
    async fn listing<T>(
        &self,
        op: &str,
        target: &str,
        base: Url,
        prefix: Option<&str>,
    ) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Named,
    {
        let mut items: Vec<T> = Vec::new();
        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("format", "json");
                if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
                    query.append_pair("prefix", prefix);
                }
                if let Some(last) = items.last() {
                    query.append_pair("marker", last.name());
                }
            }

            tracing::debug!(op, target, page = %url, "GET listing");
            let response = self.send(op, target, self.request(Method::GET, url)).await?;
            // An empty container answers 204 with no body
            if response.status() == reqwest::StatusCode::NO_CONTENT {
                break;
            }
            let page: Vec<T> = response
                .json()
                .await
                .map_err(|e| http::send_error(op, target, e))?;
            if page.is_empty() {
                break;
            }
            items.extend(page);
        }
        Ok(items)
    }
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for ListedContainer {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ListedObject {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ObjectStore for SwiftStore {
    fn account(&self) -> &str {
        &self.account
    }

    fn read_only(&self) -> bool {
        self.token.is_none()
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let listed: Vec<ListedContainer> = self
            .listing(
                "list_containers",
                &self.account,
                self.url(None, None)?,
                None,
            )
            .await?;
        Ok(listed
            .into_iter()
            .map(|c| ContainerSummary {
                name: c.name,
                count: c.count,
                bytes: c.bytes,
            })
            .collect())
    }

    async fn container_stats(&self, container: &str) -> Result<ContainerStats> {
        tracing::debug!(container, "HEAD container");
        let url = self.url(Some(container), None)?;
        let response = self
            .send(
                "container_stats",
                container,
                self.request(Method::HEAD, url),
            )
            .await?;
        let headers = response.headers();
        Ok(ContainerStats {
            object_count: header_u64(headers, CONTAINER_OBJECT_COUNT).unwrap_or(0),
            bytes_used: header_u64(headers, CONTAINER_BYTES_USED).unwrap_or(0),
        })
    }

    async fn list_objects(&self, container: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let listed: Vec<ListedObject> = self
            .listing(
                "list_objects",
                container,
                self.url(Some(container), None)?,
                prefix,
            )
            .await?;
        Ok(listed.into_iter().map(ListedObject::into_info).collect())
    }

    async fn stat_object(&self, container: &str, path: &str) -> Result<ObjectInfo> {
        let target = format!("{container}/{path}");
        tracing::debug!(object = %target, "HEAD object");
        let url = self.url(Some(container), Some(path))?;
        let response = self
            .send("stat_object", &target, self.request(Method::HEAD, url))
            .await?;
        Ok(object_info(path, response.headers()))
    }

    async fn get_object(&self, container: &str, path: &str) -> Result<Bytes> {
        let target = format!("{container}/{path}");
        tracing::debug!(object = %target, "GET object");
        let url = self.url(Some(container), Some(path))?;
        let response = self
            .send("get_object", &target, self.request(Method::GET, url))
            .await?;
        response
            .bytes()
            .await
            .map_err(|e| http::send_error("get_object", &target, e))
    }

    async fn open_object(&self, container: &str, path: &str) -> Result<ObjectStream> {
        let target = format!("{container}/{path}");
        tracing::debug!(object = %target, "GET object (streaming)");
        let url = self.url(Some(container), Some(path))?;
        let response = self
            .send("open_object", &target, self.request(Method::GET, url))
            .await?;
        let length = response.content_length();
        let chunks = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| http::send_error("open_object", &target, e)));
        Ok(ObjectStream::new(path, length, Box::pin(chunks)))
    }

    async fn put_object(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        let target = format!("{container}/{path}");
        self.ensure_writable("put_object", &target)?;
        tracing::debug!(object = %target, size = data.len(), "PUT object");

        let size = data.len() as u64;
        let url = self.url(Some(container), Some(path))?;
        let mut builder = self.request(Method::PUT, url).body(data);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let response = self.send("put_object", &target, builder).await?;

        let mut info = ObjectInfo::new(path, size);
        info.content_type = content_type.map(str::to_string);
        info.hash =
            header(response.headers(), ETAG.as_str()).map(|e| e.trim_matches('"').to_string());
        info.last_modified = header(response.headers(), LAST_MODIFIED.as_str())
            .and_then(parse_http_date)
            .or_else(|| Some(jiff::Timestamp::now()));
        Ok(info)
    }

    async fn delete_object(&self, container: &str, path: &str) -> Result<()> {
        let target = format!("{container}/{path}");
        self.ensure_writable("delete_object", &target)?;
        tracing::debug!(object = %target, "DELETE object");
        let url = self.url(Some(container), Some(path))?;
        self.send("delete_object", &target, self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }

    async fn copy_object(
        &self,
        container: &str,
        src: &str,
        dest_container: &str,
        dest: &str,
    ) -> Result<()> {
        let target = format!("{container}/{src}");
        self.ensure_writable("copy_object", &target)?;
        tracing::debug!(
            source = %target,
            dest = %format!("{dest_container}/{dest}"),
            "Server-side copy"
        );

        // X-Copy-From takes the escaped path below the account
        let source_url = self.url(Some(container), Some(src))?;
        let copy_from = source_url
            .path()
            .strip_prefix(self.storage_url.path())
            .unwrap_or(source_url.path())
            .to_string();

        let url = self.url(Some(dest_container), Some(dest))?;
        let builder = self
            .request(Method::PUT, url)
            .header(COPY_FROM, copy_from)
            .header(CONTENT_LENGTH, 0);
        self.send("copy_object", &target, builder).await?;
        Ok(())
    }

    async fn access_control(&self, container: &str) -> Result<AccessControl> {
        tracing::debug!(container, "HEAD container (ACL)");
        let url = self.url(Some(container), None)?;
        let response = self
            .send("access_control", container, self.request(Method::HEAD, url))
            .await?;
        let headers = response.headers();
        Ok(AccessControl::from_headers(
            header(headers, CONTAINER_READ),
            header(headers, CONTAINER_WRITE),
        ))
    }
}
