//! HTTP handlers for the login handoff.
//!
//! Handlers are thin: they extract the request, call [`SessionService`],
//! and map the outcome with [`crate::routing`] and [`AppError`].

use crate::error::AuthError;
use crate::service::SessionService;
use handoff_web::AppError;

pub mod oauth;
pub mod session;

/// Shared state behind every auth route.
#[derive(Debug)]
pub struct AuthHttpState<I, C> {
    /// Session service.
    pub service: SessionService<I, C>,

    /// Web origin used for default redirects and sync-logout URLs.
    pub web_origin: String,
}

impl<I, C> AuthHttpState<I, C> {
    /// Bundle a service with its web origin.
    #[must_use]
    pub fn new(service: SessionService<I, C>, web_origin: impl Into<String>) -> Self {
        Self {
            service,
            web_origin: web_origin.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::MissingCode => Self::bad_request("Missing code"),
            AuthError::InvalidToken => Self::unauthorized(err.to_string()),
            AuthError::ExchangeFailed(_)
            | AuthError::ProfileFetchFailed(_)
            | AuthError::EmailFetchFailed(_) => {
                Self::bad_gateway("Identity provider request failed").with_source(err)
            }
            AuthError::StorageFailure(_)
            | AuthError::TokenOwnershipConflict
            | AuthError::IdentityNotFound
            | AuthError::InvalidConfig(_)
            | AuthError::InternalError(_) => {
                Self::internal("An internal error occurred").with_source(err)
            }
        }
    }
}
