//! Session service: the login callback state machine and token lookups.

use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProfileCache};
use crate::state::{LoginStage, SessionResult, SessionToken, VerifiedSession};

/// Orchestrates the identity provider and the profile cache.
///
/// Generic over both so tests can run it against the mocks.
///
/// # Example
///
/// ```rust,ignore
/// let service = SessionService::new(GitHubIdentityProvider::new(config), cache);
/// let result = service.handle_login_callback(Some(&code), Some(&state)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionService<I, C> {
    provider: I,
    cache: C,
}

impl<I, C> SessionService<I, C>
where
    I: IdentityProvider,
    C: ProfileCache,
{
    /// Create a new session service.
    #[must_use]
    pub const fn new(provider: I, cache: C) -> Self {
        Self { provider, cache }
    }

    /// Borrow the profile cache.
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Build the provider authorize URL.
    ///
    /// `redirect_uri` becomes the OAuth `state` and is echoed back on the
    /// callback. Absent means the empty string.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot build the URL.
    pub fn begin_login(&self, redirect_uri: Option<&str>) -> Result<String> {
        let state = redirect_uri.unwrap_or_default();
        tracing::debug!(state = %state, "beginning login");
        self.provider.authorization_url(state)
    }

    /// Complete a login from the provider callback.
    ///
    /// Steps run strictly in sequence: code exchange, profile fetch, optional
    /// email lookup, profile upsert, token registration. Nothing is stored
    /// unless the exchange and the profile fetch both succeed.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `code` is absent or blank → `AuthError::MissingCode`
    /// - The exchange fails → `AuthError::ExchangeFailed`
    /// - The profile fetch fails → `AuthError::ProfileFetchFailed`
    /// - Persisting fails → `AuthError::StorageFailure`
    ///
    /// A failed email lookup is logged and the login continues without one.
    pub async fn handle_login_callback(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<SessionResult> {
        let mut stage = LoginStage::Started;
        trace_stage(&stage);

        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            fail(&mut stage, &AuthError::MissingCode);
            return Err(AuthError::MissingCode);
        };
        advance(&mut stage, LoginStage::CodeReceived);

        let token = self
            .provider
            .exchange_code(code)
            .await
            .inspect_err(|e| fail(&mut stage, e))?;
        advance(&mut stage, LoginStage::TokenExchanged);

        let fetched = self
            .provider
            .fetch_profile(&token)
            .await
            .inspect_err(|e| fail(&mut stage, e))?;
        advance(&mut stage, LoginStage::ProfileFetched);

        let email = match fetched.email.clone() {
            Some(email) => Some(email),
            None => self.lookup_email(&token, &mut stage).await,
        };

        let (identity, profile) = fetched.into_profile(email);

        self.cache
            .upsert(&identity, profile)
            .await
            .inspect_err(|e| fail(&mut stage, e))?;
        self.cache
            .add_token(&identity, &token)
            .await
            .inspect_err(|e| fail(&mut stage, e))?;
        advance(&mut stage, LoginStage::Stored);

        let redirect_target = state.filter(|s| !s.is_empty()).map(str::to_string);
        advance(&mut stage, LoginStage::Completed);

        tracing::info!(
            identity = %identity,
            token = %token,
            redirect_target = redirect_target.as_deref().unwrap_or("<web>"),
            "login completed"
        );

        Ok(SessionResult {
            token,
            redirect_target,
        })
    }

    async fn lookup_email(&self, token: &SessionToken, stage: &mut LoginStage) -> Option<String> {
        match self.provider.fetch_primary_verified_email(token).await {
            Ok(Some(email)) => {
                advance(stage, LoginStage::EmailFetched);
                Some(email)
            }
            Ok(None) => {
                advance(stage, LoginStage::EmailOmitted);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "email lookup failed; continuing without email");
                advance(stage, LoginStage::EmailOmitted);
                None
            }
        }
    }

    /// Resolve a bearer token to its owner and profile.
    ///
    /// Unknown tokens yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns error if the profile cache cannot be read.
    pub async fn verify_token(&self, token: &SessionToken) -> Result<Option<VerifiedSession>> {
        let found = self.cache.resolve_by_token(token).await?;
        Ok(found.map(|(identity, profile)| VerifiedSession { identity, profile }))
    }

    /// Revoke a token. Unknown tokens are not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageFailure` if the revocation cannot be
    /// persisted.
    pub async fn logout(&self, token: &SessionToken) -> Result<()> {
        self.cache.revoke_token(token).await?;
        tracing::info!(token = %token, "session revoked");
        Ok(())
    }
}

fn trace_stage(stage: &LoginStage) {
    tracing::debug!(stage = stage.label(), "login stage");
}

fn advance(stage: &mut LoginStage, next: LoginStage) {
    *stage = next;
    trace_stage(stage);
}

fn fail(stage: &mut LoginStage, error: &AuthError) {
    let from = stage.label();
    *stage = LoginStage::Failed(error.to_string());
    if error.is_user_error() {
        tracing::warn!(from, error = %error, "login failed");
    } else {
        tracing::error!(from, error = %error, "login failed");
    }
}
