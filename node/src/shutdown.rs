//! Stop signal for the HTTP server task.
//!
//! The node has one background task, the HTTP server. [`ShutdownController`]
//! flips a `watch` flag on SIGINT, SIGTERM or [`ShutdownController::shutdown`];
//! the server stops accepting connections and drains in-flight requests when
//! its [`ShutdownSignal`] resolves.

use tokio::signal;
use tokio::sync::watch;

pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// Resolves once shutdown has been requested, including before it was
/// created.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(mut self) {
        // A dropped controller also means stop.
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Request shutdown. Repeated calls are harmless.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Block until the process receives SIGINT or SIGTERM, then request
    /// shutdown.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        let sigterm = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for SIGTERM, only SIGINT stops the node");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let sigterm = std::future::pending::<()>();

        let which = tokio::select! {
            _ = signal::ctrl_c() => "SIGINT",
            _ = sigterm => "SIGTERM",
        };
        tracing::info!(signal = which, "stop requested");
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
