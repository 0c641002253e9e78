//! # Handoff authentication
//!
//! Delivers a session token to whichever client started a login: a web
//! page, or a desktop application reachable only through a custom URI
//! scheme.
//!
//! ## Components
//!
//! - [`providers::ProfileCache`]: durable identity → profile and token →
//!   identity mapping ([`stores::FileProfileCache`] in production)
//! - [`providers::IdentityProvider`]: code exchange and profile fetch
//!   ([`providers::GitHubIdentityProvider`] in production)
//! - [`service::SessionService`]: the login callback state machine
//! - [`routing`]: where to redirect after login and logout
//! - `handlers` / `router` (feature `axum`): the HTTP surface
//!
//! ## Flow
//!
//! ```text
//! browser ─▶ GET /login ─▶ provider ─▶ GET /callback?code&state
//!        ─▶ exchange → profile → (email) → upsert → add_token
//!        ─▶ 302 {state or web origin}?token=…
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use handoff_auth::{SessionService, config::OAuthConfig};
//! use handoff_auth::providers::GitHubIdentityProvider;
//! use handoff_auth::stores::FileProfileCache;
//!
//! let config = OAuthConfig::from_env()?;
//! let cache = FileProfileCache::open("data/profiles.json").await?;
//! let service = SessionService::new(GitHubIdentityProvider::new(config), cache);
//!
//! let result = service.handle_login_callback(Some(code), Some(state)).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod providers;
pub mod routing;
pub mod service;
pub mod state;
pub mod stores;

// Mock providers (for testing)
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// HTTP handlers and router (requires axum feature)
#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "axum")]
pub mod router;

// Re-export main types for convenience
pub use error::{AuthError, Result};
pub use service::SessionService;
pub use state::{Identity, LoginStage, Profile, SessionResult, SessionToken, VerifiedSession};
