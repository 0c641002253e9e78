//! Router assembly.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use handoff_auth::handlers::AuthHttpState;
use handoff_auth::providers::{IdentityProvider, ProfileCache};
use handoff_auth::router::auth_router;
use handoff_web::handlers::health_check;
use handoff_web::request_context_layer;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the complete router.
///
/// - Auth endpoints at the root (`/login`, `/callback`, `/session`, `/verify`, `/logout`)
/// - `GET /health`
/// - CORS for the web origin, so the page can call `/session` and `/logout`
/// - Request context (correlation ID, span, latency) on every route
///
/// # Errors
///
/// Returns error if the web origin is not a valid header value.
pub fn build_app<I, C>(state: Arc<AuthHttpState<I, C>>) -> anyhow::Result<Router>
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    let origin = HeaderValue::from_str(state.web_origin.trim_end_matches('/'))
        .map_err(|e| anyhow::anyhow!("invalid web origin {:?}: {e}", state.web_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(health_check))
        .merge(auth_router(state))
        .layer(cors)
        .layer(request_context_layer()))
}
