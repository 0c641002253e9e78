//! GitHub OAuth provider implementation.

use crate::config::OAuthConfig;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProviderProfile};
use crate::state::{Identity, SessionToken};
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};

/// GitHub rejects API calls without a `User-Agent`.
const CLIENT_USER_AGENT: &str = concat!("handoff-auth/", env!("CARGO_PKG_VERSION"));

/// GitHub OAuth provider.
///
/// Implements [`IdentityProvider`] against GitHub's OAuth app endpoints and
/// REST API.
///
/// # Configuration
///
/// 1. Register an OAuth app on GitHub
/// 2. Set its callback URL to `{SERVER_URL}/callback`
/// 3. Set environment variables:
///    - `GITHUB_CLIENT_ID`
///    - `GITHUB_CLIENT_SECRET`
///
/// # Example
///
/// ```no_run
/// use handoff_auth::config::OAuthConfig;
/// use handoff_auth::providers::GitHubIdentityProvider;
///
/// let github = GitHubIdentityProvider::new(OAuthConfig::new("client-id", "client-secret"));
/// ```
#[derive(Clone, Debug)]
pub struct GitHubIdentityProvider {
    /// Client credentials and endpoints.
    config: OAuthConfig,

    /// HTTP client for making requests.
    http_client: Client,
}

impl GitHubIdentityProvider {
    /// Create a new GitHub provider.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}

impl IdentityProvider for GitHubIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String> {
        let redirect_uri = self.config.callback_url();
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("scope", self.config.scope.as_str()),
            ("state", state),
        ];

        let query = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::InternalError(format!("Failed to build URL: {e}")))?;

        Ok(format!("{}?{query}", self.config.authorize_url))
    }

    async fn exchange_code(&self, code: &str) -> Result<SessionToken> {
        let body = GitHubTokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: self.config.callback_url(),
        };

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "GitHub token exchange failed: {}", error_body);
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {status}"
            )));
        }

        // GitHub reports a bad code as 200 with an error payload
        let token: GitHubTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        match token {
            GitHubTokenResponse {
                access_token: Some(access_token),
                ..
            } if !access_token.is_empty() => Ok(SessionToken::new(access_token)),
            GitHubTokenResponse {
                error: Some(error),
                error_description,
                ..
            } => {
                tracing::warn!(
                    error = %error,
                    description = error_description.as_deref().unwrap_or(""),
                    "GitHub rejected authorization code"
                );
                Err(AuthError::ExchangeFailed(error))
            }
            _ => Err(AuthError::ExchangeFailed(
                "no access token in response".to_string(),
            )),
        }
    }

    async fn fetch_profile(&self, token: &SessionToken) -> Result<ProviderProfile> {
        let response = self
            .http_client
            .get(self.api("/user"))
            .bearer_auth(token.expose())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "GitHub user request failed: {}", error_body);
            return Err(AuthError::ProfileFetchFailed(format!(
                "user endpoint returned {status}"
            )));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        Ok(ProviderProfile {
            id: user.id.into_identity(),
            login: user.login,
            avatar_url: user.avatar_url,
            email: user.email.filter(|email| !email.is_empty()),
        })
    }

    async fn fetch_primary_verified_email(&self, token: &SessionToken) -> Result<Option<String>> {
        let response = self
            .http_client
            .get(self.api("/user/emails"))
            .bearer_auth(token.expose())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| AuthError::EmailFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::EmailFetchFailed(format!(
                "emails endpoint returned {}",
                response.status()
            )));
        }

        let emails: Vec<GitHubEmail> = response
            .json()
            .await
            .map_err(|e| AuthError::EmailFetchFailed(e.to_string()))?;

        Ok(emails
            .into_iter()
            .find(|entry| entry.primary && entry.verified)
            .map(|entry| entry.email))
    }
}

/// Body of the token exchange request.
#[derive(Debug, Serialize)]
struct GitHubTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: String,
}

/// GitHub's token endpoint response.
///
/// Success and failure share the status code; only the fields differ.
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Subset of `GET /user`.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: GitHubId,
    login: String,
    #[serde(default)]
    avatar_url: String,
    email: Option<String>,
}

/// User id as sent by the provider: numeric for GitHub, a string for
/// compatible servers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubId {
    Num(u64),
    Str(String),
}

impl GitHubId {
    fn into_identity(self) -> Identity {
        match self {
            Self::Num(id) => Identity::new(id.to_string()),
            Self::Str(id) => Identity::new(id),
        }
    }
}

/// Entry of `GET /user/emails`.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}
