//! Mock profile cache for testing.

use crate::error::{AuthError, Result};
use crate::providers::ProfileCache;
use crate::state::{Identity, Profile, SessionToken};
use crate::stores::ProfileSnapshot;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock profile cache.
///
/// Uses in-memory storage for testing. Writes can be made to fail, in which
/// case the snapshot is left exactly as it was.
#[derive(Debug, Clone)]
pub struct MockProfileCache {
    snapshot: Arc<Mutex<ProfileSnapshot>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockProfileCache {
    /// Create a new, empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(ProfileSnapshot::default())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make subsequent mutations fail with `AuthError::StorageFailure`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the current snapshot (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn snapshot(&self) -> Result<ProfileSnapshot> {
        Ok(self
            .snapshot
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }

    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut ProfileSnapshot) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?;
        let mut next = guard.clone();
        let value = mutate(&mut next)?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuthError::StorageFailure("injected write failure".to_string()));
        }

        *guard = next;
        Ok(value)
    }

    fn read<T>(&self, query: impl FnOnce(&ProfileSnapshot) -> T) -> Result<T> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?;
        Ok(query(&guard))
    }
}

impl Default for MockProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCache for MockProfileCache {
    fn upsert(
        &self,
        identity: &Identity,
        profile: Profile,
    ) -> impl Future<Output = Result<()>> + Send {
        let outcome = self.commit(|snapshot| {
            snapshot.upsert(identity, profile);
            Ok(())
        });

        async move { outcome }
    }

    fn add_token(
        &self,
        identity: &Identity,
        token: &SessionToken,
    ) -> impl Future<Output = Result<()>> + Send {
        let outcome = self.commit(|snapshot| snapshot.add_token(identity, token).map(|_| ()));

        async move { outcome }
    }

    fn resolve_by_token(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Option<(Identity, Profile)>>> + Send {
        let outcome = self.read(|snapshot| snapshot.resolve_by_token(token));

        async move { outcome }
    }

    fn resolve_by_identity(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Option<(BTreeSet<SessionToken>, Profile)>>> + Send {
        let outcome = self.read(|snapshot| snapshot.resolve_by_identity(identity));

        async move { outcome }
    }

    fn revoke_token(&self, token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let outcome = self.commit(|snapshot| {
            snapshot.revoke_token(token);
            Ok(())
        });

        async move { outcome }
    }
}
