//! Asynchronous call gateway.
//!
//! # Data Flow
//! ```text
//! caller (e.g. console bridge)
//!     → RpcClient::call(name, args)      request + oneshot reply slot
//!     → bounded channel
//!     → RpcServer::serve (module's task) looks up handler, runs it
//!     → exactly one reply: value or error
//! ```
//!
//! # Design Decisions
//! - Handlers run on the task that drives `serve`, so a module's state is
//!   touched only from its own execution context
//! - No timeouts here; a caller that needs a deadline wraps the call
//! - A panicking handler becomes a `Handler` error for that call only

pub mod rpc;
pub mod types;

pub use rpc::{RpcClient, RpcServer};
pub use types::{CallGateway, GatewayError, GatewayResult};
