//! Gateway contract and error definitions.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors a gateway call can terminate with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No handler is registered under the requested name.
    #[error("function {0} not registered")]
    NotRegistered(String),

    /// A handler already exists under this name on the same server.
    #[error("function {0} already registered")]
    AlreadyRegistered(String),

    /// The handler ran and reported a failure; the message is passed through verbatim.
    #[error("{0}")]
    Handler(String),

    /// The serving side has shut down.
    #[error("call gateway closed")]
    Closed,

    /// The request was accepted but dropped before a reply was produced.
    #[error("call dropped without a reply")]
    NoReply,
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Something that can carry one named call to a handler and bring back one reply.
#[async_trait]
pub trait CallGateway: Send + Sync {
    /// Issue a single call and wait for its terminal outcome.
    async fn call(&self, name: &str, args: Vec<Value>) -> GatewayResult<Value>;
}
