//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     register modules → init modules → start console → install signal watcher
//!
//! Rendezvous (shutdown.rs):
//!     SIGINT/SIGTERM ─┐
//!     console `quit` ─┼→ single-slot channel → coordinator wakes once
//!     internal        ─┘
//!
//! Teardown (coordinator.rs):
//!     on_destroy hook → console stop → module destroy
//! ```
//!
//! # Design Decisions
//! - Ordered startup; any startup error aborts before the console serves
//! - Ordered teardown; a failing step is logged and the next still runs
//! - No timeouts on teardown steps

pub mod coordinator;
pub mod shutdown;
pub mod signals;

pub use coordinator::{
    Coordinator, LifecycleError, LifecycleState, ShutdownReport, StepOutcome, TeardownStep,
};
pub use shutdown::{Shutdown, ShutdownReason, ShutdownRendezvous, ShutdownTrigger};
pub use signals::ShutdownSignals;
