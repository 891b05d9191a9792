//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → whichever metrics recorder the embedding service installs
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated strings, for anything machine-read
//! - Metrics are cheap and become no-ops without a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
