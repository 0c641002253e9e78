//! Axum plumbing shared by Handoff services.
//!
//! Domain crates expose handlers that return [`WebResult`]; this crate
//! supplies the pieces around them:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ RequestContext middleware                │  correlation ID, span, latency
//! ├──────────────────────────────────────────┤
//! │ Extractors                               │  BearerToken, CorrelationId
//! ├──────────────────────────────────────────┤
//! │ Domain handler (e.g. handoff-auth)       │
//! ├──────────────────────────────────────────┤
//! │ AppError                                 │  status + {code, error}
//! └──────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, request_context_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
