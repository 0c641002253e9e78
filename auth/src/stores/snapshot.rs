//! In-memory snapshot shared by every profile cache implementation.
//!
//! The snapshot is the unit of persistence: [`FileProfileCache`] serializes
//! the whole value on each mutation.
//!
//! [`FileProfileCache`]: crate::stores::FileProfileCache

use crate::error::{AuthError, Result};
use crate::state::{Identity, IdentityRecord, Profile, SessionToken};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identities with their records plus the reverse token index.
///
/// Serialized as:
///
/// ```json
/// {
///   "identities": { "42": { "profile": { ... }, "tokens": ["tok1"] } },
///   "tokenIndex": { "tok1": "42" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    /// Identity records.
    #[serde(default)]
    pub identities: BTreeMap<Identity, IdentityRecord>,

    /// Token → owning identity.
    #[serde(default)]
    pub token_index: BTreeMap<SessionToken, Identity>,
}

impl ProfileSnapshot {
    /// Create or replace the profile of `identity`, keeping its tokens.
    pub fn upsert(&mut self, identity: &Identity, profile: Profile) {
        match self.identities.get_mut(identity) {
            Some(record) => record.profile = profile,
            None => {
                self.identities.insert(
                    identity.clone(),
                    IdentityRecord {
                        profile,
                        tokens: BTreeSet::new(),
                    },
                );
            }
        }
    }

    /// Bind `token` to `identity`.
    ///
    /// Returns `Ok(false)` when the binding already existed.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The token is owned by another identity → `AuthError::TokenOwnershipConflict`
    /// - The identity has no record → `AuthError::IdentityNotFound`
    pub fn add_token(&mut self, identity: &Identity, token: &SessionToken) -> Result<bool> {
        if let Some(owner) = self.token_index.get(token) {
            if owner != identity {
                return Err(AuthError::TokenOwnershipConflict);
            }
        }

        let record = self
            .identities
            .get_mut(identity)
            .ok_or(AuthError::IdentityNotFound)?;

        let inserted = record.tokens.insert(token.clone());
        self.token_index.insert(token.clone(), identity.clone());
        Ok(inserted)
    }

    /// Owner and profile of `token`.
    #[must_use]
    pub fn resolve_by_token(&self, token: &SessionToken) -> Option<(Identity, Profile)> {
        let identity = self.token_index.get(token)?;
        let record = self.identities.get(identity)?;
        Some((identity.clone(), record.profile.clone()))
    }

    /// Tokens and profile of `identity`.
    #[must_use]
    pub fn resolve_by_identity(
        &self,
        identity: &Identity,
    ) -> Option<(BTreeSet<SessionToken>, Profile)> {
        self.identities
            .get(identity)
            .map(|record| (record.tokens.clone(), record.profile.clone()))
    }

    /// Remove `token` from the index and from its owner's set.
    ///
    /// Returns `false` if the token was unknown.
    pub fn revoke_token(&mut self, token: &SessionToken) -> bool {
        let Some(identity) = self.token_index.remove(token) else {
            return false;
        };

        if let Some(record) = self.identities.get_mut(&identity) {
            record.tokens.remove(token);
        }
        true
    }

    /// Check that the token index and the per-identity sets agree.
    ///
    /// Used when loading a snapshot from disk.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageFailure` describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        for (token, identity) in &self.token_index {
            let record = self.identities.get(identity).ok_or_else(|| {
                AuthError::StorageFailure(format!(
                    "token {token} indexed to unknown identity {identity}"
                ))
            })?;
            if !record.tokens.contains(token) {
                return Err(AuthError::StorageFailure(format!(
                    "token {token} missing from identity {identity}"
                )));
            }
        }

        for (identity, record) in &self.identities {
            for token in &record.tokens {
                if self.token_index.get(token) != Some(identity) {
                    return Err(AuthError::StorageFailure(format!(
                        "token {token} of identity {identity} is not indexed"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of live tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_index.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn profile(name: &str) -> Profile {
        Profile {
            display_name: name.to_string(),
            avatar_url: format!("https://avatars.example/{name}"),
            email: None,
        }
    }

    #[test]
    fn test_upsert_keeps_tokens() {
        let mut snapshot = ProfileSnapshot::default();
        let alice = Identity::new("42");
        snapshot.upsert(&alice, profile("alice"));
        snapshot.add_token(&alice, &SessionToken::new("tok1")).unwrap();

        snapshot.upsert(&alice, profile("alice-renamed"));

        let (tokens, latest) = snapshot.resolve_by_identity(&alice).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(latest.display_name, "alice-renamed");
    }

    #[test]
    fn test_add_token_rejects_other_owner() {
        let mut snapshot = ProfileSnapshot::default();
        let alice = Identity::new("1");
        let bob = Identity::new("2");
        let token = SessionToken::new("shared");
        snapshot.upsert(&alice, profile("alice"));
        snapshot.upsert(&bob, profile("bob"));
        snapshot.add_token(&alice, &token).unwrap();

        assert_eq!(
            snapshot.add_token(&bob, &token),
            Err(AuthError::TokenOwnershipConflict)
        );
        assert_eq!(snapshot.resolve_by_token(&token).unwrap().0, alice);
    }

    #[test]
    fn test_add_token_requires_profile() {
        let mut snapshot = ProfileSnapshot::default();
        assert_eq!(
            snapshot.add_token(&Identity::new("7"), &SessionToken::new("t")),
            Err(AuthError::IdentityNotFound)
        );
        assert_eq!(snapshot.token_count(), 0);
    }

    #[test]
    fn test_add_token_is_idempotent() {
        let mut snapshot = ProfileSnapshot::default();
        let alice = Identity::new("42");
        let token = SessionToken::new("tok1");
        snapshot.upsert(&alice, profile("alice"));

        assert!(snapshot.add_token(&alice, &token).unwrap());
        assert!(!snapshot.add_token(&alice, &token).unwrap());
    }

    #[test]
    fn test_revoke_retains_identity() {
        let mut snapshot = ProfileSnapshot::default();
        let alice = Identity::new("42");
        let token = SessionToken::new("tok1");
        snapshot.upsert(&alice, profile("alice"));
        snapshot.add_token(&alice, &token).unwrap();

        assert!(snapshot.revoke_token(&token));
        assert!(!snapshot.revoke_token(&token));
        assert!(snapshot.resolve_by_token(&token).is_none());
        let (tokens, _) = snapshot.resolve_by_identity(&alice).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut snapshot = ProfileSnapshot::default();
        let alice = Identity::new("42");
        snapshot.upsert(&alice, profile("alice"));
        snapshot.add_token(&alice, &SessionToken::new("tok1")).unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tokenIndex"]["tok1"], "42");
        assert_eq!(json["identities"]["42"]["tokens"][0], "tok1");
        assert_eq!(json["identities"]["42"]["profile"]["displayName"], "alice");
    }

    #[test]
    fn test_validate_detects_dangling_index() {
        let mut snapshot = ProfileSnapshot::default();
        snapshot
            .token_index
            .insert(SessionToken::new("orphan"), Identity::new("9"));
        assert!(matches!(snapshot.validate(), Err(AuthError::StorageFailure(_))));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Upsert(u8),
        Add(u8, u8),
        Revoke(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::Upsert),
            (0u8..4, 0u8..6).prop_map(|(i, t)| Op::Add(i, t)),
            (0u8..6).prop_map(Op::Revoke),
        ]
    }

    proptest! {
        #[test]
        fn prop_index_stays_consistent(ops in proptest::collection::vec(op(), 0..64)) {
            let mut snapshot = ProfileSnapshot::default();
            for op in ops {
                match op {
                    Op::Upsert(i) => snapshot.upsert(&Identity::new(i.to_string()), profile(&i.to_string())),
                    Op::Add(i, t) => {
                        let _ = snapshot.add_token(
                            &Identity::new(i.to_string()),
                            &SessionToken::new(format!("t{t}")),
                        );
                    }
                    Op::Revoke(t) => {
                        snapshot.revoke_token(&SessionToken::new(format!("t{t}")));
                    }
                }
                prop_assert!(snapshot.validate().is_ok());
            }

            let owned: usize = snapshot.identities.values().map(|r| r.tokens.len()).sum();
            prop_assert_eq!(owned, snapshot.token_count());
        }
    }
}
