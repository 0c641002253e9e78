//! The desktop shell: routes activations to the window and the renderer,
//! and drives login and logout.

use crate::activation::{Activation, find_activation};
use crate::backend::BackendClient;
use crate::config::DesktopConfig;
use crate::error::{DesktopError, Result};
use crate::instance::Invocation;
use crate::renderer::{RendererEvent, RendererHandle};
use handoff_auth::routing::sync_logout_url;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

/// The application window.
pub trait WindowControl: Send + Sync {
    /// Make the window visible (restore if minimized).
    fn show(&self);
    /// Give the window input focus.
    fn focus(&self);
}

/// Opens URLs outside the application.
pub trait UrlOpener: Send + Sync {
    /// Open `url` in the system browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refused to open the URL.
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that(url).map_err(DesktopError::Io)
    }
}

/// What happened during a logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutReport {
    /// The renderer had a token to revoke.
    pub had_token: bool,
    /// The backend confirmed the revocation.
    pub revoked: bool,
    /// Sync URL opened in the browser, if any.
    pub sync_url: Option<String>,
    /// The renderer confirmed dropping its token.
    pub cleared: bool,
}

/// Desktop shell.
pub struct DesktopShell<W, O> {
    config: DesktopConfig,
    backend: BackendClient,
    renderer: RendererHandle,
    window: W,
    opener: O,
}

impl<W: WindowControl, O: UrlOpener> DesktopShell<W, O> {
    /// Create a shell.
    #[must_use]
    pub fn new(config: DesktopConfig, window: W, opener: O) -> Self {
        let backend = BackendClient::new(config.backend_url.clone());
        let renderer = RendererHandle::new(config.renderer_timeout);
        Self {
            config,
            backend,
            renderer,
            window,
            opener,
        }
    }

    /// Backend client.
    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Renderer handle (attach the UI here).
    pub fn renderer(&self) -> &RendererHandle {
        &self.renderer
    }

    /// Handle a launch forwarded by another process (or our own argv at
    /// startup). The window is always brought forward.
    pub async fn handle_invocation(&self, invocation: &Invocation) {
        let activation =
            find_activation(&invocation.argv, &self.config.scheme).unwrap_or(Activation::Focus);
        self.activate(activation).await;
    }

    /// Bring the window forward and deliver whatever the activation carries.
    #[instrument(skip(self))]
    pub async fn activate(&self, activation: Activation) {
        self.window.show();
        self.window.focus();

        let event = match activation {
            Activation::Token(token) => {
                info!(token = %token, "Received login token");
                RendererEvent::OAuthToken(token)
            }
            Activation::LogoutComplete => {
                info!("Received logout callback");
                RendererEvent::LogoutComplete
            }
            Activation::Focus => return,
        };
        self.renderer.push(event).await;
    }

    /// Open the backend login page in the system browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser could not be launched.
    pub fn begin_login(&self) -> Result<()> {
        let url = self.backend.login_url(&self.config.oauth_callback_uri());
        info!(%url, "Opening login page");
        self.opener.open_url(&url)
    }

    /// Log out. Always ends with the renderer told the session is over,
    /// whatever the renderer or backend do.
    pub async fn logout(&self) -> LogoutReport {
        let mut report = LogoutReport::default();

        if let Some(token) = self.renderer.read_token().await {
            report.had_token = true;
            match self.backend.logout(&token).await {
                Ok(outcome) => {
                    report.revoked = true;
                    let url = outcome.sync_logout.unwrap_or_else(|| {
                        sync_logout_url(&self.config.frontend_url, chrono::Utc::now().timestamp_millis())
                    });
                    match self.opener.open_url(&url) {
                        Ok(()) => report.sync_url = Some(url),
                        Err(e) => warn!(error = %e, "Failed to open sync-logout page"),
                    }
                }
                Err(e) => warn!(error = %e, "Backend logout failed; clearing local session anyway"),
            }
        }

        report.cleared = self.renderer.clear_token().await;
        self.renderer.push(RendererEvent::LogoutComplete).await;
        info!(revoked = report.revoked, cleared = report.cleared, "Logout complete");
        report
    }

    /// Handle forwarded invocations until the sender side closes.
    pub async fn run(&self, mut invocations: mpsc::Receiver<Invocation>) {
        while let Some(invocation) = invocations.recv().await {
            self.handle_invocation(&invocation).await;
        }
    }
}
