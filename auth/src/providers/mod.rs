//! Provider traits for the login handoff.
//!
//! The session service depends only on these traits. Concrete
//! implementations live in [`github`] (the identity provider) and in
//! [`crate::stores`] (the profile cache); in-memory fakes live in
//! [`crate::mocks`].
//!
//! ```text
//! ┌──────────────────┐   exchange / profile / email   ┌────────────────────┐
//! │ SessionService   │ ─────────────────────────────▶ │ IdentityProvider   │
//! │                  │                                └────────────────────┘
//! │                  │   upsert / add_token / resolve ┌────────────────────┐
//! │                  │ ─────────────────────────────▶ │ ProfileCache       │
//! └──────────────────┘                                └────────────────────┘
//! ```

use crate::state::{Identity, Profile};
use serde::{Deserialize, Serialize};

pub mod github;
pub mod identity;
pub mod profile_cache;

pub use github::GitHubIdentityProvider;
pub use identity::IdentityProvider;
pub use profile_cache::ProfileCache;

/// Profile as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Stable provider user id.
    pub id: Identity,

    /// Login handle.
    pub login: String,

    /// Avatar URL.
    pub avatar_url: String,

    /// Public email, often absent.
    pub email: Option<String>,
}

impl ProviderProfile {
    /// Convert into the stored profile shape, taking `email` as resolved by
    /// the caller.
    #[must_use]
    pub fn into_profile(self, email: Option<String>) -> (Identity, Profile) {
        (
            self.id,
            Profile {
                display_name: self.login,
                avatar_url: self.avatar_url,
                email,
            },
        )
    }
}
