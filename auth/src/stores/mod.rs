//! Profile cache implementations.
//!
//! - [`FileProfileCache`]: durable JSON document, the production store
//! - [`ProfileSnapshot`]: the in-memory value both it and the mock operate on

pub mod file;
pub mod snapshot;

pub use file::FileProfileCache;
pub use snapshot::ProfileSnapshot;
