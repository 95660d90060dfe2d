//! Keystone v3 identity calls
//!
//! Issues unscoped tokens from a password or an existing token, lists the
//! user's projects, and exchanges the unscoped token for a project-scoped one
//! whose service catalog names the object-store endpoint.

use hbp_core::{AuthMethod, Credentials, Error, ProjectInfo, Result, Secret};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::http::{self, AUTH_TOKEN, SUBJECT_TOKEN};

/// Catalog service type of Swift
const OBJECT_STORE: &str = "object-store";

/// A token issued by Keystone
#[derive(Debug, Clone)]
pub struct Token {
    pub id: Secret,
    pub user: Option<String>,
    pub catalog: Vec<CatalogEntry>,
}

impl Token {
    /// Object-store endpoint published for `interface`
    pub fn object_store_url(&self, interface: &str) -> Option<&str> {
        self.catalog
            .iter()
            .filter(|entry| entry.kind == OBJECT_STORE)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| endpoint.interface == interface)
            .map(|endpoint| endpoint.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    pub url: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    #[serde(default)]
    user: Option<NamedRef>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize)]
struct ProjectsResponse {
    projects: Vec<ProjectEntry>,
}

#[derive(Deserialize)]
struct ProjectEntry {
    id: String,
    name: String,
    #[serde(default = "enabled")]
    enabled: bool,
}

fn enabled() -> bool {
    true
}

fn project_scope(project_id: Option<&str>) -> Option<Value> {
    project_id.map(|id| json!({ "project": { "id": id } }))
}

/// Request body for `POST /auth/tokens`
fn token_request(credentials: &Credentials, project_id: Option<&str>) -> Value {
    let identity = match &credentials.method {
        AuthMethod::Password(password) => json!({
            "methods": ["password"],
            "password": {
                "user": {
                    "name": credentials.username,
                    "domain": { "name": credentials.user_domain },
                    "password": password.expose(),
                }
            }
        }),
        AuthMethod::Token(token) => json!({
            "methods": ["token"],
            "token": { "id": token.expose() }
        }),
    };
    let mut auth = json!({ "identity": identity });
    if let Some(scope) = project_scope(project_id) {
        auth["scope"] = scope;
    }
    json!({ "auth": auth })
}

fn rescope_request(token: &Secret, project_id: &str) -> Value {
    json!({
        "auth": {
            "identity": { "methods": ["token"], "token": { "id": token.expose() } },
            "scope": project_scope(Some(project_id)),
        }
    })
}

/// Client for the Keystone v3 API at `auth_url`
#[derive(Debug, Clone)]
pub struct Keystone {
    client: Client,
    auth_url: String,
}

impl Keystone {
    pub fn new(client: Client, auth_url: impl Into<String>) -> Self {
        let auth_url = auth_url.into().trim_end_matches('/').to_string();
        Self { client, auth_url }
    }

    /// Unscoped token for `credentials`
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Token> {
        tracing::debug!(user = %credentials.username, url = %self.auth_url, "Authenticating");
        let token = self.issue(token_request(credentials, None)).await?;
        Ok(Token {
            user: token.user.or_else(|| Some(credentials.username.clone())),
            ..token
        })
    }

    /// Token scoped to `project_id`, carrying that project's catalog
    pub async fn scope(&self, token: &Secret, project_id: &str) -> Result<Token> {
        tracing::debug!(project = project_id, "Scoping token");
        self.issue(rescope_request(token, project_id)).await
    }

    /// Enabled projects the token's user is a member of, in backend order
    pub async fn projects(&self, token: &Secret) -> Result<Vec<ProjectInfo>> {
        let url = format!("{}/auth/projects", self.auth_url);
        let response = self
            .client
            .get(&url)
            .header(AUTH_TOKEN, token.expose())
            .send()
            .await
            .map_err(|e| http::send_error("list_projects", &self.auth_url, e))?;
        let response = http::check("list_projects", &self.auth_url, response).await?;
        let body: ProjectsResponse = response
            .json()
            .await
            .map_err(|e| http::send_error("list_projects", &self.auth_url, e))?;

        Ok(body
            .projects
            .into_iter()
            .filter(|p| p.enabled)
            .map(|p| ProjectInfo::new(p.id, p.name))
            .collect())
    }

    async fn issue(&self, body: Value) -> Result<Token> {
        let url = format!("{}/auth/tokens", self.auth_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error("authenticate", &self.auth_url, e))?;
        let response = http::check("authenticate", &self.auth_url, response).await?;

        let id = response
            .headers()
            .get(SUBJECT_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(Secret::new)
            .ok_or_else(|| {
                Error::Auth(format!("{}: response carried no {SUBJECT_TOKEN}", self.auth_url))
            })?;

        let text = response
            .text()
            .await
            .map_err(|e| http::send_error("authenticate", &self.auth_url, e))?;
        parse_token(id, &text)
    }
}

fn parse_token(id: Secret, body: &str) -> Result<Token> {
    let parsed: TokenResponse = serde_json::from_str(body)?;
    Ok(Token {
        id,
        user: parsed.token.user.map(|u| u.name),
        catalog: parsed.token.catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPED: &str = r#"{
        "token": {
            "user": {"id": "u1", "name": "alice"},
            "project": {"id": "p1", "name": "bbp"},
            "catalog": [
                {"type": "identity", "endpoints": [
                    {"interface": "public", "url": "https://pollux.cscs.ch:13000/v3"}
                ]},
                {"type": "object-store", "endpoints": [
                    {"interface": "internal", "url": "http://10.0.0.1:8080/v1/AUTH_p1"},
                    {"interface": "public", "url": "https://object.cscs.ch/v1/AUTH_p1", "region": "Lugano"}
                ]}
            ]
        }
    }"#;

    #[test]
    fn test_parse_token_and_catalog() {
        let token = parse_token(Secret::new("tok"), SCOPED).unwrap();
        assert_eq!(token.user.as_deref(), Some("alice"));
        assert_eq!(
            token.object_store_url("public"),
            Some("https://object.cscs.ch/v1/AUTH_p1")
        );
        assert_eq!(
            token.object_store_url("internal"),
            Some("http://10.0.0.1:8080/v1/AUTH_p1")
        );
        assert!(token.object_store_url("admin").is_none());
    }

    #[test]
    fn test_unscoped_token_has_empty_catalog() {
        let token = parse_token(
            Secret::new("tok"),
            r#"{"token": {"methods": ["password"]}}"#,
        )
        .unwrap();
        assert!(token.catalog.is_empty());
        assert!(token.object_store_url("public").is_none());
    }

    #[test]
    fn test_password_request_body() {
        let creds =
            Credentials::with_password("alice", Secret::new("pw"), "https://ks/v3").unwrap();
        let body = token_request(&creds, None);
        let identity = &body["auth"]["identity"];
        assert_eq!(identity["methods"], json!(["password"]));
        assert_eq!(identity["password"]["user"]["name"], "alice");
        assert_eq!(identity["password"]["user"]["domain"]["name"], "Default");
        assert_eq!(identity["password"]["user"]["password"], "pw");
        assert!(body["auth"].get("scope").is_none());
    }

    #[test]
    fn test_token_request_with_scope() {
        let creds = Credentials::with_token("alice", Secret::new("t0"), "https://ks/v3").unwrap();
        let body = token_request(&creds, Some("p1"));
        assert_eq!(body["auth"]["identity"]["token"]["id"], "t0");
        assert_eq!(body["auth"]["scope"]["project"]["id"], "p1");

        let body = rescope_request(&Secret::new("t1"), "p2");
        assert_eq!(body["auth"]["identity"]["methods"], json!(["token"]));
        assert_eq!(body["auth"]["scope"]["project"]["id"], "p2");
    }

    #[test]
    fn test_disabled_projects_dropped() {
        let parsed: ProjectsResponse = serde_json::from_str(
            r#"{"projects": [
                {"id": "a", "name": "first"},
                {"id": "b", "name": "second", "enabled": false},
                {"id": "c", "name": "third", "enabled": true}
            ]}"#,
        )
        .unwrap();
        let kept: Vec<&str> = parsed
            .projects
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(kept, vec!["first", "third"]);
    }
}
