//! # Handoff Desktop
//!
//! Desktop half of the Handoff login flow.
//!
//! The browser finishes OAuth against the backend, which redirects to a
//! custom URI such as `app://oauth-callback?token=...`. The OS launches (or
//! re-launches) this application with that URI. A single primary instance
//! receives it, brings its window forward and hands the token to the
//! renderer.
//!
//! ```text
//! second launch ──argv──▶ instance ──▶ DesktopShell ──▶ window show/focus
//!                                           │
//!                                           ├──▶ renderer (token, logout)
//!                                           └──▶ backend (/verify, /logout)
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod activation;
pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod instance;
pub mod renderer;
pub mod scheme;
pub mod shell;

pub use activation::Activation;
pub use config::DesktopConfig;
pub use error::{DesktopError, Result};
pub use instance::{InstanceRole, Invocation};
pub use shell::{DesktopShell, SystemBrowser};
