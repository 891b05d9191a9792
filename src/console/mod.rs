//! Operator console.
//!
//! # Data Flow
//! ```text
//! Setup (single-threaded, before serving):
//!     ConsoleBuilder::new → builtins registered
//!     modules → register / register_external
//!     ConsoleBuilder::build → Console (registry sealed)
//!
//! Serving:
//!     line → Console::dispatch → CommandRegistry::lookup → Command::run → text
//!     external commands: ExternalCommand → CallGateway → module handler → text
//! ```
//!
//! # Design Decisions
//! - The registry can only be mutated through `ConsoleBuilder`; once built it
//!   lives behind an `Arc` and is never locked on the dispatch path
//! - Every command answers with text; failures are rendered, never raised

pub mod bridge;
pub mod builtin;
pub mod command;
pub mod registry;
pub mod server;
pub mod session;

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::net::listener::ListenerError;

pub use bridge::{BridgeErrorKind, BridgeReply, ExternalCommand};
pub use command::{Command, ConsoleContext, DebugHook};
pub use registry::CommandRegistry;
pub use server::{Console, ConsoleBuilder, RunningConsole};

/// Reply for a line whose first token names no command.
pub const NOT_FOUND: &str = "command not found, try `help` for help";

/// Pseudo-command handled by the transport: ends the session and requests shutdown.
pub const QUIT: &str = "quit";

/// Errors raised while assembling or running the console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Two commands share a name under case-insensitive comparison.
    #[error("command {0} is already registered")]
    DuplicateCommand(String),

    /// The call handler behind an external command could not be registered.
    #[error("failed to register call handler: {0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Listener(#[from] ListenerError),

    /// A console task ended abnormally.
    #[error("console task failed: {0}")]
    Task(String),
}
