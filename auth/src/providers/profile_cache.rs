//! Profile cache trait.

use crate::error::Result;
use crate::state::{Identity, Profile, SessionToken};
use std::collections::BTreeSet;

/// Durable mapping of identities to profiles and of session tokens to
/// identities.
///
/// # Invariants
///
/// - A token belongs to at most one identity
/// - A token is only indexed if its identity has a record
/// - Identity records survive logout, even with zero tokens
///
/// Every mutation is atomic with respect to the others and durable before
/// it returns.
pub trait ProfileCache: Send + Sync {
    /// Create or fully replace the profile for `identity`.
    ///
    /// Existing tokens of the identity are kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageFailure` if the change cannot be persisted.
    fn upsert(
        &self,
        identity: &Identity,
        profile: Profile,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Bind `token` to `identity`.
    ///
    /// Re-adding a token to its current owner is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The token belongs to another identity → `AuthError::TokenOwnershipConflict`
    /// - The identity has no profile → `AuthError::IdentityNotFound`
    /// - Persisting fails → `AuthError::StorageFailure`
    fn add_token(
        &self,
        identity: &Identity,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Find the owner of `token` and their current profile.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store cannot be read.
    fn resolve_by_token(
        &self,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<Option<(Identity, Profile)>>> + Send;

    /// Find the live tokens and profile of `identity`.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store cannot be read.
    fn resolve_by_identity(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<Option<(BTreeSet<SessionToken>, Profile)>>> + Send;

    /// Remove `token`. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageFailure` if the change cannot be persisted.
    fn revoke_token(
        &self,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
