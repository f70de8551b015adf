//! Graceful shutdown for the HTTP server.

use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Fans a single shutdown trigger out to any number of listeners.
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Signals every subscriber
    pub fn trigger(&self) {
        info!("Initiating graceful shutdown");
        let _ = self.shutdown_tx.send(());
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
pub struct ShutdownSignal {
    receiver: broadcast::Receiver<()>,
}

impl ShutdownSignal {
    /// Waits for shutdown signal
    pub async fn recv(mut self) {
        let _ = self.receiver.recv().await;
    }

    /// Checks if shutdown has been signaled (non-blocking)
    pub fn is_shutdown(&mut self) -> bool {
        self.receiver.try_recv().is_ok()
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
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
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Serve `app` until `stop` resolves, then give in-flight requests
/// `drain_timeout` to finish before dropping them.
///
/// # Errors
///
/// Returns the server's I/O error, if any.
pub async fn serve_until<F>(listener: TcpListener, app: Router, stop: F, drain_timeout: Duration) -> io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let coordinator = ShutdownCoordinator::new();
    let graceful = coordinator.subscribe().recv();
    let mut server = tokio::spawn(axum::serve(listener, app).with_graceful_shutdown(graceful).into_future());

    tokio::select! {
        result = &mut server => {
            info!("Server stopped before shutdown signal");
            return flatten(result);
        }
        () = stop => {}
    }

    coordinator.trigger();
    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(result) => {
            info!("Shutdown complete");
            flatten(result)
        }
        Err(_) => {
            warn!(timeout = ?drain_timeout, "Shutdown timeout reached, aborting in-flight requests");
            server.abort();
            Ok(())
        }
    }
}

/// Serve `app` until SIGTERM or SIGINT.
///
/// # Errors
///
/// Returns the server's I/O error, if any.
pub async fn serve_with_graceful_shutdown(listener: TcpListener, app: Router, drain_timeout: Duration) -> io::Result<()> {
    serve_until(listener, app, wait_for_signal(), drain_timeout).await
}

fn flatten(result: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    result.map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_signal_reaches_subscribers() {
        let coordinator = ShutdownCoordinator::new();
        let first = coordinator.subscribe();
        let mut second = coordinator.subscribe();

        assert!(!second.is_shutdown());
        coordinator.trigger();

        tokio::time::timeout(Duration::from_secs(1), first.recv())
            .await
            .unwrap();
        assert!(second.is_shutdown());
    }

    #[tokio::test]
    async fn test_serve_until_stops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/", get(|| async { "ok" }));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            serve_until(listener, app, async {}, Duration::from_secs(1)),
        )
        .await
        .unwrap();

        assert!(result.is_ok());
    }
}
