//! Shared HTTP plumbing: client construction and status mapping

use hbp_core::config::TimeoutConfig;
use hbp_core::{Error, Result};
use reqwest::{Client, Response, StatusCode};

/// Header carrying Keystone tokens in both directions
pub const AUTH_TOKEN: &str = "X-Auth-Token";

/// Header carrying a newly issued Keystone token
pub const SUBJECT_TOKEN: &str = "X-Subject-Token";

/// Build the HTTP client used for every request of a session
pub fn client(timeout: &TimeoutConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(timeout.connect())
        .read_timeout(timeout.read())
        .user_agent(concat!("hbp-archive/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::General(format!("failed to build HTTP client: {e}")))
}

/// Map a failed request to a transport error naming the operation
pub fn send_error(op: &str, target: &str, err: reqwest::Error) -> Error {
    Error::transport(op, target, err)
}

/// Error kind for a non-success status
pub fn status_error(op: &str, target: &str, status: StatusCode, body: &str) -> Error {
    let detail = body.trim();
    match status {
        StatusCode::UNAUTHORIZED => Error::Auth(format!("{op} {target}: {status}")),
        StatusCode::FORBIDDEN => Error::Permission(format!("{op} {target}")),
        StatusCode::NOT_FOUND => Error::NotFound(target.to_string()),
        _ if detail.is_empty() => Error::transport(op, target, status),
        _ => Error::transport(op, target, format!("{status}: {detail}")),
    }
}

/// Pass successful responses through, turn the rest into errors
pub async fn check(op: &str, target: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(op, target, status, &body))
}
