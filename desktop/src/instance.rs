//! Single-instance arbitration over a loopback socket.
//!
//! The first launch binds the instance port and becomes the primary. Later
//! launches find the port taken, forward their argv and working directory
//! as one JSON line, and exit.

use crate::error::{DesktopError, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Upper bound on a forwarded invocation.
const MAX_INVOCATION_BYTES: u64 = 64 * 1024;

/// How long a connected peer gets to send its invocation.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A launch of the application: its arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Command-line arguments, program name included.
    pub argv: Vec<String>,
    /// Working directory of the launching process.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Invocation of the current process.
    #[must_use]
    pub fn current() -> Self {
        Self {
            argv: std::env::args().collect(),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Invocation from explicit arguments.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }
}

/// Outcome of [`acquire`].
#[derive(Debug)]
pub enum InstanceRole {
    /// This process owns the instance port.
    Primary(PrimaryInstance),
    /// Another process is primary; the invocation was forwarded to it.
    Secondary,
}

/// The listening side held by the primary process.
#[derive(Debug)]
pub struct PrimaryInstance {
    listener: TcpListener,
}

impl PrimaryInstance {
    /// Address the primary listens on.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept forwarded invocations until the returned receiver is dropped.
    #[must_use]
    pub fn serve(self) -> mpsc::Receiver<Invocation> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(accept_loop(self.listener, tx));
        rx
    }
}

/// Claim the primary role on `addr`, or forward `invocation` to whoever
/// holds it.
///
/// # Errors
///
/// Returns `DesktopError::InstanceForward` if the port is taken but the
/// invocation cannot be delivered, and `DesktopError::Io` for other bind
/// failures.
pub async fn acquire(addr: SocketAddr, invocation: &Invocation) -> Result<InstanceRole> {
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!(%addr, "Acquired single-instance lock");
            Ok(InstanceRole::Primary(PrimaryInstance { listener }))
        }
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            forward(addr, invocation).await?;
            info!(%addr, "Forwarded invocation to running instance");
            Ok(InstanceRole::Secondary)
        }
        Err(e) => Err(e.into()),
    }
}

async fn forward(addr: SocketAddr, invocation: &Invocation) -> Result<()> {
    let mut line = serde_json::to_vec(invocation)
        .map_err(|e| DesktopError::InstanceForward(e.to_string()))?;
    line.push(b'\n');

    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| DesktopError::InstanceForward(format!("connect {addr}: {e}")))?;
    stream
        .write_all(&line)
        .await
        .map_err(|e| DesktopError::InstanceForward(e.to_string()))?;
    stream
        .shutdown()
        .await
        .map_err(|e| DesktopError::InstanceForward(e.to_string()))?;
    Ok(())
}

async fn accept_loop(listener: TcpListener, tx: mpsc::Sender<Invocation>) {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept instance connection");
                    continue;
                }
            },
            () = tx.closed() => break,
        };

        // A peer that never finishes its line must not hold up later launches
        let tx = tx.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(READ_TIMEOUT, read_invocation(stream)).await {
                Ok(Ok(invocation)) => {
                    debug!(%peer, args = invocation.argv.len(), "Received forwarded invocation");
                    let _ = tx.send(invocation).await;
                }
                Ok(Err(e)) => warn!(%peer, error = %e, "Discarding malformed invocation"),
                Err(_) => warn!(%peer, "Timed out waiting for forwarded invocation"),
            }
        });
    }
    debug!("Instance listener stopped");
}

async fn read_invocation(stream: TcpStream) -> Result<Invocation> {
    let mut reader = BufReader::new(stream.take(MAX_INVOCATION_BYTES));
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    serde_json::from_str(line.trim_end())
        .map_err(|e| DesktopError::InstanceForward(format!("bad payload: {e}")))
}
