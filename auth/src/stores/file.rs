//! JSON-file profile cache.

use crate::error::{AuthError, Result};
use crate::providers::ProfileCache;
use crate::state::{Identity, Profile, SessionToken};
use crate::stores::ProfileSnapshot;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Durable single-node profile cache backed by one JSON document.
///
/// # Implementation Notes
///
/// - One mutex serializes every operation, reads included
/// - Each mutation is applied to a copy, written and fsynced to a temp file
///   in the target directory, renamed over the target (directory fsynced on
///   unix), and only then made visible
/// - A failed write leaves both the file and the in-memory state untouched
///
/// # Example
///
/// ```no_run
/// # async fn run() -> handoff_auth::Result<()> {
/// use handoff_auth::stores::FileProfileCache;
///
/// let cache = FileProfileCache::open("data/profiles.json").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileProfileCache {
    path: PathBuf,
    snapshot: Arc<Mutex<ProfileSnapshot>>,
}

impl FileProfileCache {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageFailure` if the file exists but cannot be
    /// read, does not parse, or holds an inconsistent token index. The file
    /// is never overwritten in that case.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let snapshot = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let snapshot: ProfileSnapshot = serde_json::from_slice(&raw).map_err(|e| {
                    AuthError::StorageFailure(format!(
                        "failed to parse profile store {}: {e}",
                        path.display()
                    ))
                })?;
                snapshot.validate()?;
                snapshot
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "profile store not found; starting empty");
                ProfileSnapshot::default()
            }
            Err(error) => {
                return Err(AuthError::StorageFailure(format!(
                    "failed to read profile store {}: {error}",
                    path.display()
                )));
            }
        };

        tracing::info!(
            path = %path.display(),
            identities = snapshot.identities.len(),
            tokens = snapshot.token_count(),
            "profile store loaded"
        );

        Ok(Self {
            path,
            snapshot: Arc::new(Mutex::new(snapshot)),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the snapshot, persist it, then publish it.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut ProfileSnapshot) -> Result<(T, bool)>,
    ) -> Result<T> {
        let mut guard = self.snapshot.lock().await;
        let mut next = guard.clone();

        let (value, changed) = mutate(&mut next)?;
        if changed {
            persist(&self.path, &next).await?;
            *guard = next;
        }

        Ok(value)
    }
}

async fn persist(path: &Path, snapshot: &ProfileSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AuthError::StorageFailure(format!("failed to prepare store directory: {e}"))
        })?;
    }

    let payload = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| AuthError::StorageFailure(format!("failed to encode store: {e}")))?;
    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));

    if let Err(e) = write_synced(&temp_path, &payload).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        tracing::error!(path = %path.display(), error = %e, "profile store write failed");
        return Err(AuthError::StorageFailure(format!("failed to write store: {e}")));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        tracing::error!(path = %path.display(), error = %e, "profile store rename failed");
        return Err(AuthError::StorageFailure(format!("failed to finalize store: {e}")));
    }

    sync_parent(path)
        .await
        .map_err(|e| AuthError::StorageFailure(format!("failed to sync store directory: {e}")))
}

/// Write `payload` and flush it to the device before returning.
async fn write_synced(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(payload).await?;
    file.sync_all().await
}

/// Make the rename itself durable.
#[cfg(unix)]
async fn sync_parent(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tokio::fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl ProfileCache for FileProfileCache {
    async fn upsert(&self, identity: &Identity, profile: Profile) -> Result<()> {
        self.commit(|snapshot| {
            snapshot.upsert(identity, profile);
            Ok(((), true))
        })
        .await
    }

    async fn add_token(&self, identity: &Identity, token: &SessionToken) -> Result<()> {
        self.commit(|snapshot| {
            let inserted = snapshot.add_token(identity, token)?;
            Ok(((), inserted))
        })
        .await
    }

    async fn resolve_by_token(&self, token: &SessionToken) -> Result<Option<(Identity, Profile)>> {
        Ok(self.snapshot.lock().await.resolve_by_token(token))
    }

    async fn resolve_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<(BTreeSet<SessionToken>, Profile)>> {
        Ok(self.snapshot.lock().await.resolve_by_identity(identity))
    }

    async fn revoke_token(&self, token: &SessionToken) -> Result<()> {
        self.commit(|snapshot| Ok(((), snapshot.revoke_token(token))))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile {
            display_name: name.to_string(),
            avatar_url: format!("https://avatars.example/{name}"),
            email: Some(format!("{name}@example.com")),
        }
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileProfileCache::open(dir.path().join("profiles.json")).await.unwrap();

        let found = cache.resolve_by_token(&SessionToken::new("nope")).await.unwrap();
        assert!(found.is_none());
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_reopen_sees_prior_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profiles.json");
        let alice = Identity::new("42");

        {
            let cache = FileProfileCache::open(&path).await.unwrap();
            cache.upsert(&alice, profile("alice")).await.unwrap();
            cache.add_token(&alice, &SessionToken::new("tok1")).await.unwrap();
            cache.add_token(&alice, &SessionToken::new("tok2")).await.unwrap();
            cache.revoke_token(&SessionToken::new("tok1")).await.unwrap();
        }

        let reopened = FileProfileCache::open(&path).await.unwrap();
        assert!(reopened.resolve_by_token(&SessionToken::new("tok1")).await.unwrap().is_none());
        let (identity, found) = reopened
            .resolve_by_token(&SessionToken::new("tok2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity, alice);
        assert_eq!(found, profile("alice"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = FileProfileCache::open(&path).await;
        assert!(matches!(result, Err(AuthError::StorageFailure(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"{not json");
    }

    #[tokio::test]
    async fn test_mutation_is_on_disk_when_it_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let cache = FileProfileCache::open(&path).await.unwrap();

        cache.upsert(&Identity::new("42"), profile("alice")).await.unwrap();

        let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(on_disk.to_string().contains("alice@example.com"));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileProfileCache::open(dir.path().join("profiles.json")).await.unwrap();
        cache.upsert(&Identity::new("1"), profile("a")).await.unwrap();
        cache.upsert(&Identity::new("1"), profile("b")).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let path = store_dir.join("profiles.json");
        let alice = Identity::new("42");

        let cache = FileProfileCache::open(&path).await.unwrap();
        cache.upsert(&alice, profile("alice")).await.unwrap();
        let durable = std::fs::read(&path).unwrap();

        // Replace the store directory with a plain file so every write fails
        let parked = dir.path().join("parked");
        std::fs::rename(&store_dir, &parked).unwrap();
        std::fs::write(&store_dir, b"").unwrap();

        let result = cache.upsert(&alice, profile("mallory")).await;
        assert!(matches!(result, Err(AuthError::StorageFailure(_))));
        let result = cache.add_token(&alice, &SessionToken::new("tok1")).await;
        assert!(matches!(result, Err(AuthError::StorageFailure(_))));

        let (tokens, current) = cache.resolve_by_identity(&alice).await.unwrap().unwrap();
        assert_eq!(current.display_name, "alice");
        assert!(tokens.is_empty());

        std::fs::remove_file(&store_dir).unwrap();
        std::fs::rename(&parked, &store_dir).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), durable);
    }
}
