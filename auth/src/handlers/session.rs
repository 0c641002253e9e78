//! Session handlers: profile lookup, verification, and logout.

use crate::handlers::AuthHttpState;
use crate::providers::{IdentityProvider, ProfileCache};
use crate::routing::{LogoutOrigin, logout_sync_target};
use crate::state::{SessionToken, VerifiedSession};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use handoff_web::{AppError, BearerToken, CorrelationId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Profile of the bearer's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Stable provider identity.
    pub identity: String,

    /// Display name.
    pub display_name: String,

    /// Avatar URL.
    pub avatar_url: String,

    /// Email, `null` when unknown.
    pub email: Option<String>,
}

impl From<VerifiedSession> for SessionResponse {
    fn from(session: VerifiedSession) -> Self {
        Self {
            identity: session.identity.0,
            display_name: session.profile.display_name,
            avatar_url: session.profile.avatar_url,
            email: session.profile.email,
        }
    }
}

/// Body of `GET /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the token resolved.
    pub valid: bool,

    /// Profile, when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionResponse>,

    /// Reason, when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query of `POST /logout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutQuery {
    /// `desktop` for a logout started by the desktop shell.
    pub from: Option<String>,
}

/// Response after successful logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    /// Success message.
    pub message: String,

    /// URL the desktop shell opens so the web origin drops its token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_logout: Option<String>,
}

/// Get the profile for the bearer token.
///
/// # Endpoint
///
/// ```text
/// GET /session
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "identity": "42",
///   "displayName": "alice",
///   "avatarUrl": "https://avatars.githubusercontent.com/u/42",
///   "email": "a@x.com"
/// }
/// ```
///
/// # Errors
///
/// 401 `{code, error}` for a missing or unknown token.
pub async fn get_session<I, C>(
    State(state): State<Arc<AuthHttpState<I, C>>>,
    token: BearerToken,
) -> Result<Json<SessionResponse>, AppError>
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    let session = state
        .service
        .verify_token(&SessionToken::new(token.0))
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))?;

    Ok(Json(session.into()))
}

/// Boolean-wrapped token check.
///
/// # Endpoint
///
/// ```text
/// GET /verify
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 200 `{ "valid": true, "user": { ... } }`
/// - 401 `{ "valid": false, "error": "..." }`
pub async fn verify<I, C>(
    State(state): State<Arc<AuthHttpState<I, C>>>,
    token: Option<BearerToken>,
) -> Result<Response, AppError>
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    let invalid = |reason: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                valid: false,
                user: None,
                error: Some(reason.to_string()),
            }),
        )
            .into_response()
    };

    let Some(BearerToken(token)) = token else {
        return Ok(invalid("No token provided"));
    };

    match state.service.verify_token(&SessionToken::new(token)).await? {
        Some(session) => Ok(Json(VerifyResponse {
            valid: true,
            user: Some(session.into()),
            error: None,
        })
        .into_response()),
        None => Ok(invalid(INVALID_TOKEN)),
    }
}

/// Revoke the bearer token.
///
/// # Endpoint
///
/// ```text
/// POST /logout?from=desktop
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Logged out successfully",
///   "syncLogout": "http://localhost:4173/?sync-logout=true&t=1700000000000"
/// }
/// ```
///
/// `syncLogout` is only present for desktop-initiated logouts.
///
/// # Errors
///
/// - 401 for a missing or malformed `Authorization` header
/// - 500 if the revocation cannot be persisted
pub async fn logout<I, C>(
    State(state): State<Arc<AuthHttpState<I, C>>>,
    correlation_id: CorrelationId,
    Query(query): Query<LogoutQuery>,
    token: BearerToken,
) -> Result<Json<LogoutResponse>, AppError>
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    let origin = LogoutOrigin::from_flag(query.from.as_deref());
    tracing::info!(correlation_id = %correlation_id.0, ?origin, "logout requested");

    state.service.logout(&SessionToken::new(token.0)).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
        sync_logout: logout_sync_target(origin, &state.web_origin),
    }))
}
