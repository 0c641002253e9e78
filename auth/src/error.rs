//! Error types for session and login-callback operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the login handoff.
///
/// Lookups that simply miss (unknown token, unknown identity) are not errors;
/// they come back as `Option::None` so that "not logged in" stays distinct
/// from genuine faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Login Callback Errors
    // ═══════════════════════════════════════════════════════════

    /// The callback arrived without an authorization code.
    #[error("Missing authorization code")]
    MissingCode,

    /// The provider rejected the code or returned no access token.
    #[error("OAuth code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The profile fetch failed after a token was obtained.
    #[error("OAuth profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// The secondary email lookup failed. Never fatal for a login.
    #[error("OAuth email fetch failed: {0}")]
    EmailFetchFailed(String),

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Bearer token missing or unknown.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token is already owned by a different identity.
    #[error("Token is already bound to another identity")]
    TokenOwnershipConflict,

    /// A token was added for an identity that has no profile yet.
    #[error("Identity not found")]
    IdentityNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Persisting the profile store failed; the previous durable state stands.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Configuration is missing or malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if the error was caused by the caller's input rather
    /// than by the provider or by local storage.
    ///
    /// # Examples
    ///
    /// ```
    /// # use handoff_auth::AuthError;
    /// assert!(AuthError::MissingCode.is_user_error());
    /// assert!(!AuthError::StorageFailure("disk full".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::MissingCode | Self::InvalidToken)
    }

    /// Returns `true` if the error came from a call to the identity provider.
    #[must_use]
    pub const fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ExchangeFailed(_) | Self::ProfileFetchFailed(_) | Self::EmailFetchFailed(_)
        )
    }
}
