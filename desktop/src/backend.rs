//! HTTP client for the Handoff backend.

use crate::error::{DesktopError, Result};
use handoff_auth::SessionToken;
use handoff_auth::routing::DESKTOP_ORIGIN_FLAG;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Profile returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Stable provider identity.
    pub identity: String,
    /// Display name.
    pub display_name: String,
    /// Avatar URL.
    pub avatar_url: String,
    /// Email, if known.
    #[serde(default)]
    pub email: Option<String>,
}

/// Outcome of a token check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether the token is live.
    pub valid: bool,
    /// Profile, when valid.
    #[serde(default)]
    pub user: Option<UserInfo>,
    /// Reason, when not valid.
    #[serde(default)]
    pub error: Option<String>,
}

impl VerifyOutcome {
    fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            user: None,
            error: Some(error.into()),
        }
    }
}

/// Backend reply to a desktop logout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOutcome {
    /// URL to open so the web origin forgets its token.
    #[serde(default)]
    pub sync_logout: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for `/login`, `/verify`, `/session` and `/logout`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl BackendClient {
    /// Client for the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// URL that starts a login whose result comes back to `callback_uri`.
    #[must_use]
    pub fn login_url(&self, callback_uri: &str) -> String {
        format!(
            "{}/login?redirect_uri={}",
            self.base_url,
            urlencoding::encode(callback_uri)
        )
    }

    /// Check a token. Never fails: transport and HTTP errors come back as
    /// an invalid outcome carrying the error text.
    pub async fn verify(&self, token: &SessionToken) -> VerifyOutcome {
        match self.try_verify(token).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(token = %token, error = %e, "Token verification failed");
                VerifyOutcome::invalid(e.to_string())
            }
        }
    }

    async fn try_verify(&self, token: &SessionToken) -> Result<VerifyOutcome> {
        let response = self
            .http_client
            .get(format!("{}/verify", self.base_url))
            .bearer_auth(token.expose())
            .send()
            .await?;

        // 401 carries a `{valid: false, error}` body too
        Ok(response.json().await?)
    }

    /// Fetch the profile behind a token.
    ///
    /// # Errors
    ///
    /// Returns `DesktopError::Backend` on transport errors or a non-success
    /// status (with the backend's error message when it sent one).
    pub async fn session(&self, token: &SessionToken) -> Result<UserInfo> {
        let response = self
            .http_client
            .get(format!("{}/session", self.base_url))
            .bearer_auth(token.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Revoke a token, flagging the call as coming from the desktop.
    ///
    /// # Errors
    ///
    /// Returns `DesktopError::Backend` on transport errors or a non-success
    /// status.
    pub async fn logout(&self, token: &SessionToken) -> Result<LogoutOutcome> {
        let response = self
            .http_client
            .post(format!("{}/logout", self.base_url))
            .query(&[("from", DESKTOP_ORIGIN_FLAG)])
            .bearer_auth(token.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let outcome = response.json().await.unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable logout response; assuming no sync URL");
            LogoutOutcome::default()
        });
        Ok(outcome)
    }
}

async fn error_from(response: reqwest::Response) -> DesktopError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => DesktopError::Backend(format!("{status}: {}", body.error)),
        Err(_) => DesktopError::Backend(format!("backend returned {status}")),
    }
}
