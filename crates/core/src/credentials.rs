//! Credential resolution
//!
//! A password is taken from an explicit argument, then from an environment
//! variable, then from a hidden terminal prompt. Resolved secrets are never
//! logged or written to disk.

use std::fmt;

use crate::error::{Error, Result};

/// Environment variable consulted before prompting
pub const PASSWORD_ENV: &str = "CSCS_PASS";

/// Keystone domain used when none is configured
pub const DEFAULT_DOMAIN: &str = "Default";

/// A password or token. Debug and Display never show the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value, only for sending it to the backend
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// How a session proves its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password(Secret),
    /// An already issued (unscoped) token
    Token(Secret),
}

/// Everything needed to authenticate against the identity service
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub auth_url: String,
    /// Keystone domain the user belongs to
    pub user_domain: String,
    pub method: AuthMethod,
}

impl Credentials {
    /// Password credentials; fails if the password is empty
    pub fn with_password(
        username: impl Into<String>,
        password: Secret,
        auth_url: impl Into<String>,
    ) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::Auth("password must not be empty".into()));
        }
        Ok(Self {
            username: username.into(),
            auth_url: auth_url.into(),
            user_domain: DEFAULT_DOMAIN.to_string(),
            method: AuthMethod::Password(password),
        })
    }

    /// Token credentials; fails if the token is empty
    pub fn with_token(
        username: impl Into<String>,
        token: Secret,
        auth_url: impl Into<String>,
    ) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Auth("token must not be empty".into()));
        }
        Ok(Self {
            username: username.into(),
            auth_url: auth_url.into(),
            user_domain: DEFAULT_DOMAIN.to_string(),
            method: AuthMethod::Token(token),
        })
    }

    pub fn user_domain(mut self, domain: impl Into<String>) -> Self {
        self.user_domain = domain.into();
        self
    }
}

/// Supplies a password when none was given explicitly
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    fn password(&self, username: &str) -> Result<Secret>;
}

/// Reads an environment variable, falling back to a hidden terminal prompt
#[derive(Debug, Clone)]
pub struct EnvOrPrompt {
    var: String,
    interactive: Option<bool>,
}

impl EnvOrPrompt {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            interactive: None,
        }
    }

    /// Override terminal detection; `false` never prompts
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    fn from_env(&self) -> Option<Secret> {
        std::env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(Secret::new)
    }
}

impl Default for EnvOrPrompt {
    fn default() -> Self {
        Self::new(PASSWORD_ENV)
    }
}

impl CredentialSource for EnvOrPrompt {
    fn password(&self, username: &str) -> Result<Secret> {
        if let Some(secret) = self.from_env() {
            tracing::debug!(var = %self.var, "Using password from environment");
            return Ok(secret);
        }

        let term = console::Term::stderr();
        if !self.interactive.unwrap_or_else(|| term.is_term()) {
            return Err(Error::Auth(format!(
                "no password source available: {} is not set and the terminal is not interactive",
                self.var
            )));
        }

        term.write_str(&format!("Password for {username}: "))?;
        let line = term.read_secure_line()?;
        Ok(Secret::new(line))
    }
}

/// A fixed password, for scripts and tests
#[derive(Debug, Clone)]
pub struct StaticPassword(Secret);

impl StaticPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Secret::new(password))
    }
}

impl CredentialSource for StaticPassword {
    fn password(&self, _username: &str) -> Result<Secret> {
        Ok(self.0.clone())
    }
}

/// Resolve a password: the explicit argument wins, otherwise ask `source`
pub fn resolve_password(
    username: &str,
    explicit: Option<String>,
    source: &dyn CredentialSource,
) -> Result<Secret> {
    let secret = match explicit {
        Some(password) => Secret::new(password),
        None => source.password(username)?,
    };

    if secret.is_empty() {
        return Err(Error::Auth(format!("empty password for user {username}")));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(****)");
        assert_eq!(secret.to_string(), "****");
        assert_eq!(secret.expose(), "hunter2");

        let creds = Credentials::with_password("alice", secret, "https://id.example/v3").unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_explicit_password_skips_source() {
        let mut source = MockCredentialSource::new();
        source.expect_password().never();

        let secret = resolve_password("alice", Some("pw".into()), &source).unwrap();
        assert_eq!(secret.expose(), "pw");
    }

    #[test]
    fn test_source_consulted_without_explicit_password() {
        let mut source = MockCredentialSource::new();
        source
            .expect_password()
            .times(1)
            .returning(|_| Ok(Secret::new("from-source")));

        let secret = resolve_password("alice", None, &source).unwrap();
        assert_eq!(secret.expose(), "from-source");
    }

    #[test]
    fn test_empty_password_rejected() {
        let source = StaticPassword::new("");
        let err = resolve_password("alice", None, &source).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));

        let err = resolve_password("alice", Some(String::new()), &source).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_source_failure_propagates() {
        let mut source = MockCredentialSource::new();
        source
            .expect_password()
            .returning(|_| Err(Error::Auth("no password source available".into())));

        let err = resolve_password("alice", None, &source).unwrap_err();
        assert!(err.to_string().contains("no password source"));
    }

    #[test]
    fn test_env_source_reads_variable() {
        let var = "HBP_CORE_TEST_PASSWORD_ENV";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(var, "from-env") };
        let source = EnvOrPrompt::new(var);
        assert_eq!(source.password("alice").unwrap().expose(), "from-env");
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn test_non_interactive_without_env_fails() {
        let var = "HBP_CORE_TEST_UNSET_PASSWORD_ENV";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::remove_var(var) };
        let source = EnvOrPrompt::new(var).interactive(false);

        let err = source.password("alice").unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "{err:?}");
        let message = err.to_string();
        assert!(
            message.contains("no password source available"),
            "{message}"
        );
        assert!(message.contains(var), "{message}");
        assert_eq!(err.exit_code(), 4);

        let err = resolve_password("alice", None, &source).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(Credentials::with_password("a", Secret::new(""), "u").is_err());
        assert!(Credentials::with_token("a", Secret::new(""), "u").is_err());
        let creds = Credentials::with_token("a", Secret::new("tok"), "u")
            .unwrap()
            .user_domain("hbp");
        assert_eq!(creds.user_domain, "hbp");
        assert!(matches!(creds.method, AuthMethod::Token(_)));
    }
}
