//! Mock identity provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProviderProfile};
use crate::state::{Identity, SessionToken};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock identity provider.
///
/// Returns scripted responses and counts calls. The default script is a
/// GitHub user `42`/`alice` with no public email whose primary verified
/// address is `a@x.com`, logging in with token `tok1`.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    exchange: Result<SessionToken>,
    expected_code: Option<String>,
    profile: Result<ProviderProfile>,
    email: Result<Option<String>>,
    exchange_calls: Arc<AtomicUsize>,
    profile_calls: Arc<AtomicUsize>,
    email_calls: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    /// Create a new mock provider with the default script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exchange: Ok(SessionToken::new("tok1")),
            expected_code: None,
            profile: Ok(ProviderProfile {
                id: Identity::new("42"),
                login: "alice".to_string(),
                avatar_url: "https://avatars.example/u/42".to_string(),
                email: None,
            }),
            email: Ok(Some("a@x.com".to_string())),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            profile_calls: Arc::new(AtomicUsize::new(0)),
            email_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock whose code exchange always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self::new().with_exchange_error("bad_verification_code")
    }

    /// Issue `token` on a successful exchange.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.exchange = Ok(SessionToken::new(token));
        self
    }

    /// Only accept `code`; any other code fails the exchange.
    #[must_use]
    pub fn with_expected_code(mut self, code: &str) -> Self {
        self.expected_code = Some(code.to_string());
        self
    }

    /// Fail the exchange with `reason`.
    #[must_use]
    pub fn with_exchange_error(mut self, reason: &str) -> Self {
        self.exchange = Err(AuthError::ExchangeFailed(reason.to_string()));
        self
    }

    /// Return `profile` from the profile fetch.
    #[must_use]
    pub fn with_profile(mut self, profile: ProviderProfile) -> Self {
        self.profile = Ok(profile);
        self
    }

    /// Fail the profile fetch with `reason`.
    #[must_use]
    pub fn with_profile_error(mut self, reason: &str) -> Self {
        self.profile = Err(AuthError::ProfileFetchFailed(reason.to_string()));
        self
    }

    /// Return `email` from the multi-email lookup.
    #[must_use]
    pub fn with_primary_email(mut self, email: Option<&str>) -> Self {
        self.email = Ok(email.map(str::to_string));
        self
    }

    /// Fail the multi-email lookup with `reason`.
    #[must_use]
    pub fn with_email_error(mut self, reason: &str) -> Self {
        self.email = Err(AuthError::EmailFetchFailed(reason.to_string()));
        self
    }

    /// Number of `exchange_code` calls so far.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_profile` calls so far.
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_primary_verified_email` calls so far.
    #[must_use]
    pub fn email_calls(&self) -> usize {
        self.email_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!(
            "https://github.example/login/oauth/authorize?client_id=mock&state={}",
            urlencoding::encode(state)
        ))
    }

    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<SessionToken>> + Send {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match &self.expected_code {
            Some(expected) if expected != code => {
                Err(AuthError::ExchangeFailed("bad_verification_code".to_string()))
            }
            _ => self.exchange.clone(),
        };

        async move { outcome }
    }

    fn fetch_profile(
        &self,
        _token: &SessionToken,
    ) -> impl Future<Output = Result<ProviderProfile>> + Send {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.profile.clone();

        async move { outcome }
    }

    fn fetch_primary_verified_email(
        &self,
        _token: &SessionToken,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        self.email_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.email.clone();

        async move { outcome }
    }
}
