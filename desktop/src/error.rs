//! Error types for the desktop shell.

use thiserror::Error;

/// Result type alias for desktop operations.
pub type Result<T> = std::result::Result<T, DesktopError>;

/// Desktop shell errors.
#[derive(Debug, Error)]
pub enum DesktopError {
    /// Local I/O failed (sockets, token file, desktop entry).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend call failed or returned an unexpected response.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The running instance could not be reached.
    #[error("Failed to forward activation to running instance: {0}")]
    InstanceForward(String),

    /// The URI scheme could not be registered with the OS.
    #[error("URI scheme registration failed: {0}")]
    SchemeRegistration(String),

    /// An activation URI of our scheme could not be parsed.
    #[error("Invalid activation URI: {0}")]
    InvalidActivation(String),

    /// Configuration is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DesktopError {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
