//! Network plumbing for the console's line transport.
//!
//! # Responsibilities
//! - Bind the console address
//! - Bound concurrent operator sessions (backpressure)

pub mod listener;

pub use listener::{ConnectionPermit, Listener, ListenerError};
