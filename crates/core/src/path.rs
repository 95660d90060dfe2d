//! Path parsing and resolution
//!
//! Handles remote paths of the form `container[/key]`, public container URLs
//! of the form `<endpoint>/v1/AUTH_<id>/<container>`, and the mapping of
//! remote object names onto the local filesystem.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// A parsed remote path pointing into a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Container name
    pub container: String,
    /// Object key (empty for container root)
    pub key: String,
    /// Whether the path ends with a slash (directory semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        let is_dir = key.ends_with('/') || key.is_empty();
        Self {
            container: container.into(),
            key,
            is_dir,
        }
    }

    /// Parse `container[/key]`
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".into()));
        }

        let (container, key) = match path.split_once('/') {
            Some((container, key)) => (container, key),
            None => (path, ""),
        };

        if container.is_empty() {
            return Err(Error::InvalidPath("Container name cannot be empty".into()));
        }

        Ok(Self::new(container, key))
    }

    /// Key without a trailing slash, or `None` at container root
    pub fn prefix(&self) -> Option<&str> {
        if self.key.is_empty() {
            None
        } else {
            Some(self.key.as_str())
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.container)
        } else {
            write!(f, "{}/{}", self.container, self.key)
        }
    }
}

/// A public container URL split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrl {
    /// The URL as given, without trailing slash
    pub url: String,
    /// `<endpoint>/v1/AUTH_<id>`
    pub storage_url: String,
    /// `<id>` without the `AUTH_` prefix
    pub account_id: String,
    pub container: String,
}

impl PublicUrl {
    /// Parse `<endpoint>/v1/AUTH_<id>/<container>`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim_end_matches('/');
        let url = Url::parse(trimmed)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("{input}: expected http or https")));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let auth_pos = segments
            .iter()
            .position(|s| s.starts_with("AUTH_"))
            .ok_or_else(|| Error::InvalidUrl(format!("{input}: missing AUTH_<id> segment")))?;

        if auth_pos == 0 || segments[auth_pos - 1] != "v1" {
            return Err(Error::InvalidUrl(format!("{input}: expected /v1/AUTH_<id>/<container>")));
        }
        if segments.len() != auth_pos + 2 {
            return Err(Error::InvalidUrl(format!(
                "{input}: expected exactly one container after AUTH_<id>"
            )));
        }

        let account_id = segments[auth_pos].trim_start_matches("AUTH_").to_string();
        if account_id.is_empty() {
            return Err(Error::InvalidUrl(format!("{input}: empty account id")));
        }

        let container = percent_decode(segments[auth_pos + 1]);
        let storage_url = trimmed
            .rsplit_once('/')
            .map(|(base, _)| base.to_string())
            .unwrap_or_default();

        Ok(Self {
            url: trimmed.to_string(),
            storage_url,
            account_id,
            container,
        })
    }
}

impl std::fmt::Display for PublicUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

fn percent_decode(segment: &str) -> String {
    let escaped = format!("x={}", segment.replace('+', "%2B"));
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

/// Directory part of an object name ("" at top level)
pub fn dirname(name: &str) -> &str {
    match name.trim_end_matches('/').rfind('/') {
        Some(pos) => &name[..pos],
        None => "",
    }
}

/// Last component of an object name
pub fn basename(name: &str) -> &str {
    let name = name.trim_end_matches('/');
    match name.rfind('/') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Join a directory prefix and a name with exactly one slash
pub fn join_key(directory: &str, name: &str) -> String {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Local destination of remote object `name` under `target_dir`
///
/// The remote directory structure is preserved. Names that would escape
/// `target_dir` are refused.
pub fn local_path(target_dir: &Path, name: &str) -> Result<PathBuf> {
    let mut path = target_dir.to_path_buf();
    let mut pushed = false;
    for part in name.split('/').filter(|p| !p.is_empty()) {
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) if Path::new(part).components().count() == 1 => {
                path.push(part);
                pushed = true;
            }
            _ => {
                return Err(Error::InvalidPath(format!(
                    "refusing to map remote name '{name}' onto the local filesystem"
                )));
            }
        }
    }
    if !pushed {
        return Err(Error::InvalidPath(format!("remote name '{name}' has no file component")));
    }
    Ok(path)
}
