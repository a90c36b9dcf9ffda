//! Launch the server and refresher together on background tasks.
//!
//! [`spawn_observatory`] is what `main` and the client integration tests
//! use. It takes a bound listener so callers can bind port 0 and read
//! the real address back from the handle.
//!
//! ```rust,ignore
//! let listener = TcpListener::bind("127.0.0.1:0").await?;
//! let handle = spawn_observatory(listener, Arc::new(state))?;
//! let base = format!("http://{}", handle.addr());
//! // ...
//! handle.shutdown().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::refresher::spawn_refresher;
use crate::server::{ServerError, serve_on};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The listener has no usable local address.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Running server and refresher tasks.
#[derive(Debug)]
pub struct ObservatoryHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
    refresher: JoinHandle<()>,
}

impl ObservatoryHandle {
    /// Address the server is listening on.
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the refresher, then drain in-flight requests and stop the
    /// server.
    pub async fn shutdown(self) {
        self.refresher.abort();
        // The receiver is gone only if the server already exited.
        let _ = self.shutdown.send(());
        match self.server.await {
            Err(e) if !e.is_cancelled() => tracing::error!(error = %e, "server task panicked"),
            _ => {}
        }
    }
}

/// Spawn the HTTP server on `listener` and start the dashboard refresher.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener's local address
/// cannot be read.
pub fn spawn_observatory(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<ObservatoryHandle, StartupError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address: {e}")))?;

    let (tx, rx) = oneshot::channel::<()>();
    let refresher = spawn_refresher(Arc::clone(&state));
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = serve_on(listener, state, shutdown).await {
            tracing::error!(error = %e, "Observatory server exited with error");
        }
    });

    tracing::info!(%addr, "Observatory spawned on background tasks");

    Ok(ObservatoryHandle {
        addr,
        shutdown: tx,
        server,
        refresher,
    })
}
