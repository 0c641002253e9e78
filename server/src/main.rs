//! Handoff backend HTTP server.

use handoff_auth::SessionService;
use handoff_auth::handlers::AuthHttpState;
use handoff_auth::providers::GitHubIdentityProvider;
use handoff_auth::stores::FileProfileCache;
use handoff_server::{Config, build_app, telemetry};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config.server.log_level);

    info!(
        server_url = %config.oauth.server_url,
        frontend_url = %config.oauth.frontend_url,
        store = %config.server.profile_store_path.display(),
        "Configuration loaded"
    );

    let cache = FileProfileCache::open(&config.server.profile_store_path).await?;
    let provider = GitHubIdentityProvider::new(config.oauth.clone());
    let service = SessionService::new(provider, cache);
    let state = Arc::new(AuthHttpState::new(service, config.oauth.frontend_url.clone()));

    let app = build_app(state)?;

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    let stop = Arc::new(Notify::new());
    let serve = axum::serve(listener, app).with_graceful_shutdown({
        let stop = Arc::clone(&stop);
        async move { stop.notified().await }
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        result = &mut server => {
            result??;
            info!("Server stopped");
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    stop.notify_one();
    match tokio::time::timeout(Duration::from_secs(config.server.shutdown_timeout), server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout,
            "Graceful shutdown timed out; dropping open connections"
        ),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
