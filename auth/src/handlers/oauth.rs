//! Login handlers: the start of the OAuth flow and the provider callback.

use crate::error::AuthError;
use crate::handlers::AuthHttpState;
use crate::providers::{IdentityProvider, ProfileCache};
use crate::routing::login_redirect;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Response},
};
use handoff_web::{AppError, CorrelationId};
use serde::Deserialize;
use std::sync::Arc;

/// Body of the generic callback failure page.
const CALLBACK_ERROR_PAGE: &str = "<!doctype html>\
<html><head><title>Sign-in failed</title></head>\
<body><h1>OAuth callback error</h1>\
<p>Sign-in could not be completed. Please close this window and try again.</p>\
</body></html>";

/// Query of `GET /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    /// Where the token should be delivered after login.
    pub redirect_uri: Option<String>,
}

/// Query of `GET /callback`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code from the provider.
    pub code: Option<String>,

    /// Return target supplied at `/login`.
    pub state: Option<String>,

    /// Error reported by the provider, e.g. `access_denied`.
    pub error: Option<String>,
}

/// 302 Found to `location`.
fn found(location: &str) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(location)
        .map_err(|e| AppError::internal("Invalid redirect location").with_source(e))?;
    Ok((StatusCode::FOUND, [(LOCATION, value)]).into_response())
}

/// Start the OAuth flow.
///
/// # Endpoint
///
/// ```text
/// GET /login?redirect_uri=app://oauth-callback
/// ```
///
/// # Response
///
/// HTTP 302 redirect to the provider's authorize page, with `redirect_uri`
/// carried in `state`.
///
/// # Errors
///
/// Returns 500 if the authorize URL cannot be built.
pub async fn login<I, C>(
    State(state): State<Arc<AuthHttpState<I, C>>>,
    correlation_id: CorrelationId,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError>
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    tracing::info!(
        correlation_id = %correlation_id.0,
        has_redirect = query.redirect_uri.is_some(),
        "login requested"
    );

    let url = state.service.begin_login(query.redirect_uri.as_deref())?;
    found(&url)
}

/// Provider callback.
///
/// # Endpoint
///
/// ```text
/// GET /callback?code=...&state=...
/// ```
///
/// # Response
///
/// - 302 to `state` (or the web origin) with `token` appended
/// - 400 `Missing code` when no code was sent
/// - 500 generic error page for any other failure
pub async fn callback<I, C>(
    State(state): State<Arc<AuthHttpState<I, C>>>,
    correlation_id: CorrelationId,
    Query(query): Query<CallbackQuery>,
) -> Response
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    if let Some(provider_error) = &query.error {
        tracing::warn!(
            correlation_id = %correlation_id.0,
            error = %provider_error,
            "provider reported an error on callback"
        );
    }

    let outcome = state
        .service
        .handle_login_callback(query.code.as_deref(), query.state.as_deref())
        .await;

    match outcome {
        Ok(session) => {
            let location = login_redirect(
                session.redirect_target.as_deref(),
                &state.web_origin,
                &session.token,
            );
            found(&location).unwrap_or_else(|err| {
                tracing::error!(correlation_id = %correlation_id.0, error = %err, "redirect failed");
                callback_error_page()
            })
        }
        Err(AuthError::MissingCode) => (StatusCode::BAD_REQUEST, "Missing code").into_response(),
        Err(err) => {
            tracing::error!(correlation_id = %correlation_id.0, error = %err, "OAuth callback error");
            callback_error_page()
        }
    }
}

fn callback_error_page() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(CALLBACK_ERROR_PAGE)).into_response()
}
