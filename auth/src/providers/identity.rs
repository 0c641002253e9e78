//! Identity provider trait.

use crate::error::Result;
use crate::providers::ProviderProfile;
use crate::state::SessionToken;

/// External OAuth identity provider.
///
/// # Implementation Notes
///
/// - All calls are made at most once per login callback, strictly in order
/// - No retries; a failed call aborts the login (except the email lookup)
pub trait IdentityProvider: Send + Sync {
    /// Build the provider's authorize URL.
    ///
    /// `state` is echoed back verbatim on the callback.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the query cannot be encoded.
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExchangeFailed` if:
    /// - The request fails
    /// - The provider answers with an error payload
    /// - The response carries no access token
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<SessionToken>> + Send;

    /// Fetch the profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProfileFetchFailed` on transport, status, or
    /// decoding failures.
    fn fetch_profile(
        &self,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<ProviderProfile>> + Send;

    /// Look up the address that is both primary and verified.
    ///
    /// Returns `Ok(None)` when no entry qualifies.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailFetchFailed` on transport, status, or
    /// decoding failures.
    fn fetch_primary_verified_email(
        &self,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}
