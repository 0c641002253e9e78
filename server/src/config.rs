//! Configuration management for the backend.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first when present.

use handoff_auth::config::OAuthConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// OAuth client and endpoint configuration
    pub oauth: OAuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Location of the profile store document
    pub profile_store_path: PathBuf,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    /// Load from `HOST`, `PORT`, `RUST_LOG`, `PROFILE_STORE_PATH` and
    /// `SHUTDOWN_TIMEOUT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            log_level: env::var("RUST_LOG")
                .unwrap_or_else(|_| "handoff_server=info,handoff_auth=info,handoff_web=info".to_string()),
            profile_store_path: env::var("PROFILE_STORE_PATH")
                .map_or_else(|_| PathBuf::from("data/profiles.json"), PathBuf::from),
            shutdown_timeout: env::var("SHUTDOWN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load the full configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the OAuth client credentials are missing.
    pub fn from_env() -> anyhow::Result<Self> {
        // Missing .env is fine; real deployments set variables directly
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig::from_env(),
            oauth: OAuthConfig::from_env()?,
        })
    }
}
