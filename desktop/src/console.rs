//! Terminal renderer: persists the token in a file and prints what the shell
//! pushes.

use crate::error::Result;
use crate::renderer::{RendererEndpoint, RendererEvent, RendererRequest};
use crate::shell::WindowControl;
use handoff_auth::SessionToken;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The renderer's persisted token.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Token stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the token; `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an I/O error other than "not found".
    pub async fn load(&self) -> Result<Option<SessionToken>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| SessionToken::new(token)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub async fn store(&self, token: &SessionToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token.expose()).await?;
        Ok(())
    }

    /// Remove the token. Removing a missing token is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error other than "not found".
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A "window" that is the terminal itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleWindow;

impl WindowControl for ConsoleWindow {
    fn show(&self) {
        debug!("show window");
    }

    fn focus(&self) {
        debug!("focus window");
    }
}

/// Serve the renderer side of the channel until the shell goes away.
pub async fn run_console_renderer(mut endpoint: RendererEndpoint, tokens: TokenFile) {
    loop {
        tokio::select! {
            Some(event) = endpoint.events.recv() => handle_event(event, &tokens).await,
            Some(request) = endpoint.requests.recv() => handle_request(request, &tokens).await,
            else => break,
        }
    }
    debug!("Console renderer stopped");
}

async fn handle_event(event: RendererEvent, tokens: &TokenFile) {
    match event {
        RendererEvent::OAuthToken(token) => match tokens.store(&token).await {
            Ok(()) => println!("Logged in."),
            Err(e) => warn!(error = %e, "Failed to persist token"),
        },
        RendererEvent::LogoutComplete => println!("Logged out."),
    }
}

async fn handle_request(request: RendererRequest, tokens: &TokenFile) {
    match request {
        RendererRequest::ReadToken(reply) => {
            let token = tokens.load().await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read token");
                None
            });
            let _ = reply.send(token);
        }
        RendererRequest::ClearToken(reply) => {
            if let Err(e) = tokens.clear().await {
                warn!(error = %e, "Failed to remove token");
                return;
            }
            let _ = reply.send(());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::renderer::{RendererHandle, renderer_channel};
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenFile::new(dir.path().join("nested").join("auth_token"));

        assert_eq!(tokens.load().await.unwrap(), None);
        tokens.store(&SessionToken::new("tok1")).await.unwrap();
        assert_eq!(tokens.load().await.unwrap(), Some(SessionToken::new("tok1")));

        tokens.clear().await.unwrap();
        tokens.clear().await.unwrap();
        assert_eq!(tokens.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_console_renderer_answers_shell() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenFile::new(dir.path().join("auth_token"));
        let handle = RendererHandle::new(Duration::from_secs(1));
        let (link, endpoint) = renderer_channel(4);
        handle.attach(link).await;
        tokio::spawn(run_console_renderer(endpoint, tokens.clone()));

        handle
            .push(RendererEvent::OAuthToken(SessionToken::new("tok1")))
            .await;
        // Give the renderer time to persist the token
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.read_token().await, Some(SessionToken::new("tok1")));

        assert!(handle.clear_token().await);
        assert_eq!(tokens.load().await.unwrap(), None);
    }
}
