//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from hbp-core.
//! Buckets play the role of containers.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use bytes::Bytes;
use futures::stream;

use hbp_core::config::{S3Config, TimeoutConfig};
use hbp_core::{
    AccessControl, ContainerStats, ContainerSummary, Error, ObjectInfo, ObjectStore,
    ObjectStream, Result, Secret,
};

/// S3 client wrapper
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    endpoint: String,
}

impl S3Store {
    /// Create a new client for `config.endpoint` with a static key pair
    pub async fn connect(
        config: &S3Config,
        secret: &Secret,
        timeout: &TimeoutConfig,
    ) -> Result<Self> {
        url::Url::parse(&config.endpoint)?;

        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            secret.expose().to_string(),
            None, // session token
            None, // expiry
            "hbp-static-credentials",
        );

        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(timeout.connect())
            .read_timeout(timeout.read())
            .build();

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .timeout_config(timeouts)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        tracing::debug!(endpoint = %config.endpoint, "S3 client ready");
        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            endpoint: config.endpoint.clone(),
        })
    }
}

/// How an SDK failure maps onto the error kinds of hbp-core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Auth,
    Permission,
    NotFound,
    Transport,
}

fn classify(status: Option<u16>, code: Option<&str>) -> Failure {
    match (status, code) {
        (_, Some("InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken")) => Failure::Auth,
        (_, Some("AccessDenied" | "AllAccessDisabled")) => Failure::Permission,
        (_, Some("NoSuchKey" | "NoSuchBucket" | "NotFound")) => Failure::NotFound,
        (Some(401), _) => Failure::Auth,
        (Some(403), _) => Failure::Permission,
        (Some(404), _) => Failure::NotFound,
        _ => Failure::Transport,
    }
}

fn map_sdk_error<E>(op: &str, target: &str, err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    match classify(status, code.as_deref()) {
        Failure::Auth => Error::Auth(format!("{op} {target}: credentials rejected")),
        Failure::Permission => Error::Permission(format!("{op} {target}")),
        Failure::NotFound => Error::NotFound(target.to_string()),
        Failure::Transport => Error::transport(op, target, DisplayErrorContext(&err)),
    }
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

fn etag(value: &str) -> String {
    value.trim_matches('"').to_string()
}

#[async_trait]
impl ObjectStore for S3Store {
    fn account(&self) -> &str {
        &self.endpoint
    }

    /// Bucket listings carry no usage figures; counts and sizes are zero.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        tracing::debug!("list_buckets");
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error("list_buckets", &self.endpoint, e))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(|name| ContainerSummary {
                name: name.to_string(),
                count: 0,
                bytes: 0,
            })
            .collect())
    }

    /// S3 keeps no usage counters on buckets, so this walks the listing.
    async fn container_stats(&self, container: &str) -> Result<ContainerStats> {
        let objects = self.list_objects(container, None).await?;
        Ok(ContainerStats {
            object_count: objects.len() as u64,
            bytes_used: objects.iter().filter_map(|o| o.bytes).sum(),
        })
    }

    async fn list_objects(&self, container: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            tracing::debug!(bucket = container, ?prefix, "list_objects_v2");
            let mut request = self.inner.list_objects_v2().bucket(container);
            if let Some(p) = prefix.filter(|p| !p.is_empty()) {
                request = request.prefix(p);
            }
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_sdk_error("list_objects", container, e))?;

            for object in response.contents() {
                let key = object.key().unwrap_or_default();
                let mut info = ObjectInfo::unknown(key);
                info.bytes = object.size().and_then(|s| u64::try_from(s).ok());
                info.last_modified = object.last_modified().and_then(timestamp);
                info.hash = object.e_tag().map(etag);
                items.push(info);
            }

            continuation = response.next_continuation_token().map(str::to_string);
            if !response.is_truncated().unwrap_or(false) || continuation.is_none() {
                break;
            }
        }

        Ok(items)
    }

    async fn stat_object(&self, container: &str, path: &str) -> Result<ObjectInfo> {
        tracing::debug!(bucket = container, key = path, "head_object");
        let target = format!("{container}/{path}");
        let response = self
            .inner
            .head_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(|e| map_sdk_error("head_object", &target, e))?;

        let mut info = ObjectInfo::unknown(path);
        info.bytes = response.content_length().and_then(|s| u64::try_from(s).ok());
        info.content_type = response.content_type().map(str::to_string);
        info.hash = response.e_tag().map(etag);
        info.last_modified = response.last_modified().and_then(timestamp);
        Ok(info)
    }

    async fn get_object(&self, container: &str, path: &str) -> Result<Bytes> {
        self.open_object(container, path).await?.read_to_end().await
    }

    async fn open_object(&self, container: &str, path: &str) -> Result<ObjectStream> {
        tracing::debug!(bucket = container, key = path, "get_object");
        let target = format!("{container}/{path}");
        let response = self
            .inner
            .get_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(|e| map_sdk_error("get_object", &target, e))?;

        let length = response.content_length().and_then(|s| u64::try_from(s).ok());
        let chunks = stream::unfold((response.body, target), |(mut body, target)| async move {
            match body.next().await {
                Some(Ok(chunk)) => Some((Ok(chunk), (body, target))),
                Some(Err(e)) => {
                    let err = Error::transport("get_object", &target, e);
                    Some((Err(err), (body, target)))
                }
                None => None,
            }
        });
        Ok(ObjectStream::new(path, length, Box::pin(chunks)))
    }

    async fn put_object(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        tracing::debug!(bucket = container, key = path, size = data.len(), "put_object");
        let target = format!("{container}/{path}");
        let size = data.len() as u64;
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        let mut request = self
            .inner
            .put_object()
            .bucket(container)
            .key(path)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error("put_object", &target, e))?;

        let mut info = ObjectInfo::new(path, size);
        info.content_type = content_type.map(str::to_string);
        info.hash = response.e_tag().map(etag);
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }

    async fn delete_object(&self, container: &str, path: &str) -> Result<()> {
        let target = format!("{container}/{path}");
        // S3 deletes are idempotent; check existence first so a missing key is reported
        self.stat_object(container, path).await?;

        tracing::debug!(bucket = container, key = path, "delete_object");
        self.inner
            .delete_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(|e| map_sdk_error("delete_object", &target, e))?;

        Ok(())
    }

    async fn copy_object(
        &self,
        container: &str,
        src: &str,
        dest_container: &str,
        dest: &str,
    ) -> Result<()> {
        let copy_source = encode_copy_source(container, src);
        tracing::debug!(source = %copy_source, bucket = dest_container, key = dest, "copy_object");

        self.inner
            .copy_object()
            .copy_source(&copy_source)
            .bucket(dest_container)
            .key(dest)
            .send()
            .await
            .map_err(|e| map_sdk_error("copy_object", &format!("{container}/{src}"), e))?;

        Ok(())
    }

    async fn access_control(&self, container: &str) -> Result<AccessControl> {
        Err(Error::UnsupportedFeature(format!(
            "access_control {container}: S3 buckets do not expose Swift ACLs"
        )))
    }
}

/// `x-amz-copy-source` value: bucket and key, each path segment percent-encoded
fn encode_copy_source(bucket: &str, key: &str) -> String {
    std::iter::once(bucket)
        .chain(key.split('/'))
        .map(|segment| {
            url::form_urlencoded::byte_serialize(segment.as_bytes())
                .collect::<String>()
                .replace('+', "%20")
        })
        .collect::<Vec<_>>()
        .join("/")
}
