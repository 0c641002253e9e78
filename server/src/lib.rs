//! Backend for the Handoff login flow.
//!
//! Wires the GitHub identity provider and the file-backed profile cache into
//! the auth router and serves it.

pub mod app;
pub mod config;
pub mod telemetry;

pub use app::build_app;
pub use config::{Config, ServerConfig};
