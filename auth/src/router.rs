//! Authentication router composition.

use crate::handlers::{AuthHttpState, oauth, session};
use crate::providers::{IdentityProvider, ProfileCache};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the router with every auth endpoint.
///
/// # Routes
///
/// - `GET /login` - Redirect to the identity provider
/// - `GET /callback` - Handle the provider callback
/// - `GET /session` - Profile for the bearer token
/// - `GET /verify` - Boolean-wrapped token check
/// - `POST /logout` - Revoke the bearer token
///
/// # Example
///
/// ```rust,ignore
/// let state = Arc::new(AuthHttpState::new(service, config.frontend_url.clone()));
///
/// let app = Router::new()
///     .merge(auth_router(state))
///     .layer(request_context_layer());
/// ```
pub fn auth_router<I, C>(state: Arc<AuthHttpState<I, C>>) -> Router
where
    I: IdentityProvider + 'static,
    C: ProfileCache + 'static,
{
    Router::new()
        .route("/login", get(oauth::login::<I, C>))
        .route("/callback", get(oauth::callback::<I, C>))
        .route("/session", get(session::get_session::<I, C>))
        .route("/verify", get(session::verify::<I, C>))
        .route("/logout", post(session::logout::<I, C>))
        .with_state(state)
}
