//! Channel-backed gateway implementation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use crate::gateway::types::{CallGateway, GatewayError, GatewayResult};

/// A registered call handler.
pub type Handler = Arc<dyn Fn(Vec<Value>) -> Result<Value, String> + Send + Sync>;

/// Default depth of the pending-call queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

struct CallRequest {
    name: String,
    args: Vec<Value>,
    reply: oneshot::Sender<GatewayResult<Value>>,
}

/// Serving side of the gateway: a handler table plus the queue of pending calls.
pub struct RpcServer {
    handlers: DashMap<String, Handler>,
    tx: mpsc::Sender<CallRequest>,
    rx: Mutex<mpsc::Receiver<CallRequest>>,
}

impl RpcServer {
    /// Create a server whose queue holds at most `queue_depth` pending calls.
    pub fn new(queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        Self {
            handlers: DashMap::new(),
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Register a handler under `name`.
    pub fn register<F>(&self, name: &str, handler: F) -> GatewayResult<()>
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        use dashmap::mapref::entry::Entry;

        match self.handlers.entry(name.to_string()) {
            Entry::Occupied(_) => Err(GatewayError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(handler));
                Ok(())
            }
        }
    }

    /// Whether a handler exists under `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// A cloneable handle callers use to reach this server.
    pub fn client(&self) -> RpcClient {
        RpcClient {
            tx: self.tx.clone(),
        }
    }

    /// Process calls until `shutdown` fires.
    ///
    /// Calls still queued when shutdown arrives are answered with
    /// [`GatewayError::Closed`].
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut rx = self.rx.lock().await;

        loop {
            tokio::select! {
                request = rx.recv() => match request {
                    Some(request) => self.exec(request),
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }

        rx.close();
        while let Ok(request) = rx.try_recv() {
            let _ = request.reply.send(Err(GatewayError::Closed));
        }
        tracing::debug!("Call gateway stopped serving");
    }

    fn exec(&self, request: CallRequest) {
        let handler = self
            .handlers
            .get(&request.name)
            .map(|entry| Arc::clone(entry.value()));

        let outcome = match handler {
            None => Err(GatewayError::NotRegistered(request.name.clone())),
            Some(handler) => {
                let args = request.args;
                match catch_unwind(AssertUnwindSafe(|| handler(args))) {
                    Ok(result) => result.map_err(GatewayError::Handler),
                    Err(_) => {
                        tracing::error!(function = %request.name, "Call handler panicked");
                        Err(GatewayError::Handler(format!(
                            "function {} panicked",
                            request.name
                        )))
                    }
                }
            }
        };

        if request.reply.send(outcome).is_err() {
            tracing::debug!(function = %request.name, "Caller went away before the reply");
        }
    }
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

/// Calling side of an [`RpcServer`].
#[derive(Clone)]
pub struct RpcClient {
    tx: mpsc::Sender<CallRequest>,
}

#[async_trait]
impl CallGateway for RpcClient {
    async fn call(&self, name: &str, args: Vec<Value>) -> GatewayResult<Value> {
        let (reply, outcome) = oneshot::channel();
        self.tx
            .send(CallRequest {
                name: name.to_string(),
                args,
                reply,
            })
            .await
            .map_err(|_| GatewayError::Closed)?;

        outcome.await.map_err(|_| GatewayError::NoReply)?
    }
}
