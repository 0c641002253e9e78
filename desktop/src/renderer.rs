//! Channel between the shell and the renderer (the UI that owns the token).
//!
//! Events are fire-and-forget and are dropped when no renderer is attached.
//! Requests are answered through a oneshot and bounded by a timeout, so an
//! unresponsive renderer can never stall the shell.

use handoff_auth::SessionToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, warn};

/// Pushed from the shell to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererEvent {
    /// A login completed with this token.
    OAuthToken(SessionToken),
    /// The session has been logged out.
    LogoutComplete,
}

/// Questions the shell asks the renderer.
#[derive(Debug)]
pub enum RendererRequest {
    /// Reply with the persisted token, if any.
    ReadToken(oneshot::Sender<Option<SessionToken>>),
    /// Remove the persisted token; reply once done.
    ClearToken(oneshot::Sender<()>),
}

/// Shell side of an attached renderer.
#[derive(Debug, Clone)]
pub struct RendererLink {
    events: mpsc::Sender<RendererEvent>,
    requests: mpsc::Sender<RendererRequest>,
}

/// Renderer side: the receivers it must drain.
#[derive(Debug)]
pub struct RendererEndpoint {
    /// Events pushed by the shell.
    pub events: mpsc::Receiver<RendererEvent>,
    /// Requests awaiting a reply.
    pub requests: mpsc::Receiver<RendererRequest>,
}

/// Create a connected link/endpoint pair.
#[must_use]
pub fn renderer_channel(capacity: usize) -> (RendererLink, RendererEndpoint) {
    let (events_tx, events_rx) = mpsc::channel(capacity);
    let (requests_tx, requests_rx) = mpsc::channel(capacity);
    (
        RendererLink {
            events: events_tx,
            requests: requests_tx,
        },
        RendererEndpoint {
            events: events_rx,
            requests: requests_rx,
        },
    )
}

/// The shell's handle on whichever renderer is currently attached.
#[derive(Debug, Clone)]
pub struct RendererHandle {
    link: Arc<RwLock<Option<RendererLink>>>,
    timeout: Duration,
}

impl RendererHandle {
    /// Handle with no renderer attached.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            link: Arc::new(RwLock::new(None)),
            timeout,
        }
    }

    /// Attach a renderer, replacing any previous one.
    pub async fn attach(&self, link: RendererLink) {
        *self.link.write().await = Some(link);
    }

    /// Detach the current renderer.
    pub async fn detach(&self) {
        *self.link.write().await = None;
    }

    /// Whether a live renderer is attached.
    pub async fn is_attached(&self) -> bool {
        self.link
            .read()
            .await
            .as_ref()
            .is_some_and(|link| !link.events.is_closed())
    }

    /// Push an event. Returns `false` if it was dropped.
    pub async fn push(&self, event: RendererEvent) -> bool {
        let Some(link) = self.current().await else {
            debug!(?event, "No renderer attached; dropping event");
            return false;
        };

        match link.events.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Renderer did not accept event; dropping it");
                false
            }
        }
    }

    /// Ask the renderer for its persisted token.
    ///
    /// `None` if no renderer is attached, it has no token, or it did not
    /// answer in time.
    pub async fn read_token(&self) -> Option<SessionToken> {
        self.ask(RendererRequest::ReadToken).await.flatten()
    }

    /// Ask the renderer to drop its persisted token.
    ///
    /// Returns `false` if the renderer did not confirm in time.
    pub async fn clear_token(&self) -> bool {
        self.ask(RendererRequest::ClearToken).await.is_some()
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> RendererRequest) -> Option<T> {
        let link = self.current().await?;
        let (reply_tx, reply_rx) = oneshot::channel();

        let exchange = async {
            link.requests.send(make(reply_tx)).await.ok()?;
            reply_rx.await.ok()
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "Renderer request timed out");
                None
            }
        }
    }

    async fn current(&self) -> Option<RendererLink> {
        self.link.read().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_push_without_renderer_is_dropped() {
        let handle = RendererHandle::new(SHORT);
        assert!(!handle.push(RendererEvent::LogoutComplete).await);
        assert!(!handle.is_attached().await);
    }

    #[tokio::test]
    async fn test_push_reaches_attached_renderer() {
        let handle = RendererHandle::new(SHORT);
        let (link, mut endpoint) = renderer_channel(4);
        handle.attach(link).await;

        let token = SessionToken::new("tok1");
        assert!(handle.push(RendererEvent::OAuthToken(token.clone())).await);
        assert_eq!(endpoint.events.recv().await, Some(RendererEvent::OAuthToken(token)));
    }

    #[tokio::test]
    async fn test_push_after_renderer_gone_is_dropped() {
        let handle = RendererHandle::new(SHORT);
        let (link, endpoint) = renderer_channel(4);
        handle.attach(link).await;
        drop(endpoint);

        assert!(!handle.is_attached().await);
        assert!(!handle.push(RendererEvent::LogoutComplete).await);
    }

    #[tokio::test]
    async fn test_read_token_answered() {
        let handle = RendererHandle::new(SHORT);
        let (link, mut endpoint) = renderer_channel(4);
        handle.attach(link).await;

        tokio::spawn(async move {
            if let Some(RendererRequest::ReadToken(reply)) = endpoint.requests.recv().await {
                let _ = reply.send(Some(SessionToken::new("stored")));
            }
        });

        assert_eq!(handle.read_token().await, Some(SessionToken::new("stored")));
    }

    #[tokio::test]
    async fn test_unresponsive_renderer_times_out() {
        let handle = RendererHandle::new(SHORT);
        let (link, _endpoint) = renderer_channel(4);
        handle.attach(link).await;

        assert_eq!(handle.read_token().await, None);
        assert!(!handle.clear_token().await);
    }

    #[tokio::test]
    async fn test_detach() {
        let handle = RendererHandle::new(SHORT);
        let (link, _endpoint) = renderer_channel(4);
        handle.attach(link).await;
        assert!(handle.is_attached().await);

        handle.detach().await;
        assert!(!handle.is_attached().await);
        assert_eq!(handle.read_token().await, None);
    }
}
