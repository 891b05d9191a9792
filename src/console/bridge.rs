//! Console commands served by a module through the call gateway.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::console::command::{Command, ConsoleContext};
use crate::gateway::{CallGateway, GatewayResult};

/// Reply when a handler answers with anything but a string.
pub const INVALID_OUTPUT: &str = "invalid output type";

/// Why a bridged call did not produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeErrorKind {
    /// The gateway or the handler reported a failure.
    Gateway,
    /// The handler succeeded with a non-text value.
    InvalidOutput,
}

/// Outcome of one bridged call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeReply {
    Text(String),
    Error {
        kind: BridgeErrorKind,
        message: String,
    },
}

impl BridgeReply {
    pub fn from_outcome(outcome: GatewayResult<Value>) -> Self {
        match outcome {
            Ok(Value::String(text)) => BridgeReply::Text(text),
            Ok(_) => BridgeReply::Error {
                kind: BridgeErrorKind::InvalidOutput,
                message: INVALID_OUTPUT.to_string(),
            },
            Err(e) => BridgeReply::Error {
                kind: BridgeErrorKind::Gateway,
                message: e.to_string(),
            },
        }
    }

    /// The text an operator sees.
    pub fn into_text(self) -> String {
        match self {
            BridgeReply::Text(text) => text,
            BridgeReply::Error { message, .. } => message,
        }
    }
}

/// A command whose body lives behind a [`CallGateway`].
pub struct ExternalCommand {
    name: String,
    help: String,
    gateway: Arc<dyn CallGateway>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, help: impl Into<String>, gateway: Arc<dyn CallGateway>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            gateway,
        }
    }

    /// Make exactly one call and classify its outcome.
    pub async fn call(&self, args: &[String]) -> BridgeReply {
        let args = args.iter().cloned().map(Value::String).collect();
        let outcome = self.gateway.call(&self.name, args).await;

        if let Err(e) = &outcome {
            tracing::warn!(command = %self.name, error = %e, "External command failed");
        }
        BridgeReply::from_outcome(outcome)
    }
}

#[async_trait]
impl Command for ExternalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }

    async fn run(&self, _ctx: &ConsoleContext, args: &[String]) -> String {
        self.call(args).await.into_text()
    }
}
