//! Desktop configuration.
//!
//! Loaded from environment variables with defaults that match a local
//! backend on port 3001 and a web origin on port 4173.

use crate::error::{DesktopError, Result};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Desktop shell configuration.
#[derive(Debug, Clone)]
pub struct DesktopConfig {
    /// Custom URI scheme, without `://`.
    ///
    /// Default: `app`
    pub scheme: String,

    /// Backend base URL.
    pub backend_url: String,

    /// Web origin, used when the backend does not return a sync-logout URL.
    pub frontend_url: String,

    /// Loopback port used for single-instance arbitration.
    pub instance_port: u16,

    /// How long to wait for the renderer to answer a request.
    pub renderer_timeout: Duration,

    /// Application name (desktop entry, data directory).
    pub app_name: String,

    /// Directory holding the renderer's persisted token.
    pub data_dir: PathBuf,
}

impl DesktopConfig {
    /// Load from `HANDOFF_SCHEME`, `HANDOFF_BACKEND_URL`,
    /// `HANDOFF_FRONTEND_URL`, `HANDOFF_INSTANCE_PORT`,
    /// `HANDOFF_RENDERER_TIMEOUT_MS`, `HANDOFF_APP_NAME` and
    /// `HANDOFF_DATA_DIR`.
    ///
    /// # Errors
    ///
    /// Returns `DesktopError::Config` if the scheme is not a valid URI scheme.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let app_name = env::var("HANDOFF_APP_NAME").unwrap_or(defaults.app_name);

        let config = Self {
            scheme: env::var("HANDOFF_SCHEME").unwrap_or(defaults.scheme),
            backend_url: env::var("HANDOFF_BACKEND_URL").unwrap_or(defaults.backend_url),
            frontend_url: env::var("HANDOFF_FRONTEND_URL").unwrap_or(defaults.frontend_url),
            instance_port: env::var("HANDOFF_INSTANCE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.instance_port),
            renderer_timeout: env::var("HANDOFF_RENDERER_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.renderer_timeout, Duration::from_millis),
            data_dir: env::var("HANDOFF_DATA_DIR")
                .map_or_else(|_| default_data_dir(&app_name), PathBuf::from),
            app_name,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the scheme against RFC 3986: a letter followed by letters,
    /// digits, `+`, `-` or `.`.
    ///
    /// # Errors
    ///
    /// Returns `DesktopError::Config` describing the problem.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.scheme.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

        if valid {
            Ok(())
        } else {
            Err(DesktopError::Config(format!(
                "invalid URI scheme {:?}",
                self.scheme
            )))
        }
    }

    /// Loopback address of the single-instance listener.
    #[must_use]
    pub fn instance_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.instance_port))
    }

    /// URI the backend redirects to after login.
    #[must_use]
    pub fn oauth_callback_uri(&self) -> String {
        format!("{}://oauth-callback", self.scheme)
    }

    /// Path of the renderer's persisted token.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("auth_token")
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name.to_lowercase())
}

impl Default for DesktopConfig {
    fn default() -> Self {
        let app_name = "Handoff".to_string();
        Self {
            scheme: "app".to_string(),
            backend_url: "http://localhost:3001".to_string(),
            frontend_url: "http://localhost:4173".to_string(),
            instance_port: 47_219,
            renderer_timeout: Duration::from_secs(2),
            data_dir: default_data_dir(&app_name),
            app_name,
        }
    }
}
