//! Mock provider implementations for testing.
//!
//! Simple, in-memory implementations of the provider traits for use in unit
//! and integration tests.

pub mod identity;
pub mod profile_cache;

pub use identity::MockIdentityProvider;
pub use profile_cache::MockProfileCache;
