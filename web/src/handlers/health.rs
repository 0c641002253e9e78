//! Liveness endpoint.

use axum::http::StatusCode;

/// Liveness check. Does not touch the profile store or the provider.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```text
/// 200 OK
/// ok
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
