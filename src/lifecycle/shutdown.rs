//! Shutdown coordination.
//!
//! Two primitives live here:
//! - [`Shutdown`]: a broadcast fan-out telling long-running tasks to stop
//! - [`ShutdownRendezvous`]: the single-slot channel the coordinator blocks
//!   on; signal watcher and internal triggers all feed it

use tokio::sync::{broadcast, mpsc};

use crate::observability::metrics;

/// Fan-out stop signal for long-running tasks.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the process is going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / SIGTERM (or Ctrl-C).
    Signal,
    /// An operator typed `quit` on the console.
    Operator,
    /// Requested programmatically by a module or embedder.
    Internal,
}

impl ShutdownReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ShutdownReason::Signal => "signal",
            ShutdownReason::Operator => "operator",
            ShutdownReason::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-slot rendezvous: holds at most one pending shutdown request.
pub struct ShutdownRendezvous {
    tx: mpsc::Sender<ShutdownReason>,
    rx: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownRendezvous {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    /// A handle that can place a request on this rendezvous.
    pub fn trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            tx: self.tx.clone(),
        }
    }

    /// Wait for a request and take it.
    pub async fn wait(&mut self) -> ShutdownReason {
        // `self.tx` keeps the channel open, so `None` cannot happen.
        self.rx.recv().await.unwrap_or(ShutdownReason::Internal)
    }
}

impl Default for ShutdownRendezvous {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle for requesting shutdown.
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: mpsc::Sender<ShutdownReason>,
}

impl ShutdownTrigger {
    /// Place a request on the rendezvous.
    ///
    /// Returns `false` when a request is already pending or the coordinator
    /// is gone; the request is dropped, not queued.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let accepted = self.tx.try_send(reason).is_ok();
        metrics::record_shutdown_trigger(reason.as_str(), accepted);

        if accepted {
            tracing::info!(reason = %reason, "Shutdown requested");
        } else {
            tracing::debug!(reason = %reason, "Shutdown already pending; request dropped");
        }
        accepted
    }
}
