//! OAuth login configuration.
//!
//! Values come from the application (usually the environment), never from
//! hardcoded constants inside providers.

use crate::error::{AuthError, Result};
use std::env;

/// GitHub's authorize endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub's token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub's REST API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// OAuth login configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    /// OAuth application client ID.
    pub client_id: String,

    /// OAuth application client secret (keep confidential).
    pub client_secret: String,

    /// Public base URL of this backend.
    ///
    /// The provider redirects to `{server_url}/callback`.
    pub server_url: String,

    /// Web origin used when the login request carried no return target.
    pub frontend_url: String,

    /// Provider authorize endpoint.
    pub authorize_url: String,

    /// Provider token endpoint.
    pub token_url: String,

    /// Provider REST API base URL.
    pub api_url: String,

    /// Requested scope.
    ///
    /// Default: `user:email`
    pub scope: String,
}

impl OAuthConfig {
    /// Create new OAuth configuration with GitHub endpoints and local defaults.
    ///
    /// # Arguments
    ///
    /// * `client_id` - OAuth application client ID
    /// * `client_secret` - OAuth application client secret
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `GITHUB_CLIENT_ID` and `GITHUB_CLIENT_SECRET` are required. The rest
    /// fall back to defaults: `SERVER_URL`, `FRONTEND_URL`,
    /// `GITHUB_AUTHORIZE_URL`, `GITHUB_TOKEN_URL`, `GITHUB_API_URL`,
    /// `OAUTH_SCOPE`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("GITHUB_CLIENT_ID")
            .map_err(|_| AuthError::InvalidConfig("GITHUB_CLIENT_ID is not set".to_string()))?;
        let client_secret = env::var("GITHUB_CLIENT_SECRET").map_err(|_| {
            AuthError::InvalidConfig("GITHUB_CLIENT_SECRET is not set".to_string())
        })?;

        let defaults = Self::default();

        Ok(Self {
            client_id,
            client_secret,
            server_url: env::var("SERVER_URL").unwrap_or(defaults.server_url),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            authorize_url: env::var("GITHUB_AUTHORIZE_URL").unwrap_or(defaults.authorize_url),
            token_url: env::var("GITHUB_TOKEN_URL").unwrap_or(defaults.token_url),
            api_url: env::var("GITHUB_API_URL").unwrap_or(defaults.api_url),
            scope: env::var("OAUTH_SCOPE").unwrap_or(defaults.scope),
        })
    }

    /// Set the public backend URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the web origin.
    #[must_use]
    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = url.into();
        self
    }

    /// Point every provider endpoint at one base URL.
    ///
    /// Used by tests to talk to a local mock server: the authorize and token
    /// endpoints keep GitHub's paths under `base`, and `base` itself serves
    /// as the API root.
    #[must_use]
    pub fn with_provider_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.authorize_url = format!("{base}/login/oauth/authorize");
        self.token_url = format!("{base}/login/oauth/access_token");
        self.api_url = base.to_string();
        self
    }

    /// Set requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// URL the provider redirects back to.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.server_url.trim_end_matches('/'))
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            server_url: "http://localhost:3001".to_string(),
            frontend_url: "http://localhost:4173".to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scope: "user:email".to_string(),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("server_url", &self.server_url)
            .field("frontend_url", &self.frontend_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("scope", &self.scope)
            .finish()
    }
}
