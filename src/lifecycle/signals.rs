//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT / SIGTERM (Ctrl-C elsewhere)
//! - Report which one arrived so the coordinator can log it
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Installation is separate from waiting: once `install` returns, a
//!   termination signal is routed here instead of killing the process

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Installed termination-signal listeners.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Register the handlers. Must be called inside a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next termination signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        }
    }
}

/// Installed termination-signal listeners.
#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    /// Wait for Ctrl-C.
    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}
