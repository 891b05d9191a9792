//! Line transport: one task per operator connection.
//!
//! # Protocol
//! ```text
//! server: <prompt>
//! client: <command> [args...]\n
//! server: <reply>\r\n<prompt>
//! client: quit\n          → shutdown requested, connection closed
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::console::command::ConsoleContext;
use crate::console::QUIT;
use crate::lifecycle::{Shutdown, ShutdownReason, ShutdownTrigger};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Accept sessions until `shutdown` fires, then wait for all of them.
pub(crate) async fn accept_loop(
    listener: Listener,
    ctx: Arc<ConsoleContext>,
    prompt: String,
    trigger: ShutdownTrigger,
    shutdown: Shutdown,
) {
    let mut stop = shutdown.subscribe();
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = stop.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    let session = Session {
                        id: Uuid::new_v4(),
                        peer,
                        ctx: Arc::clone(&ctx),
                        prompt: prompt.clone(),
                        trigger: trigger.clone(),
                    };
                    let session_stop = shutdown.subscribe();
                    sessions.spawn(async move {
                        session.run(stream, session_stop).await;
                        drop(permit);
                    });
                }
                Err(ListenerError::Closed) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Console accept failed");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            },
            Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "Console session task failed");
                }
            }
        }
    }

    while let Some(finished) = sessions.join_next().await {
        if let Err(e) = finished {
            tracing::error!(error = %e, "Console session task failed");
        }
    }
}

struct Session {
    id: Uuid,
    peer: SocketAddr,
    ctx: Arc<ConsoleContext>,
    prompt: String,
    trigger: ShutdownTrigger,
}

impl Session {
    async fn run(self, stream: TcpStream, mut stop: broadcast::Receiver<()>) {
        tracing::info!(session = %self.id, peer = %self.peer, "Console session opened");
        metrics::record_session(true);

        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        if writer.write_all(self.prompt.as_bytes()).await.is_ok() {
            loop {
                let line = tokio::select! {
                    _ = stop.recv() => break,
                    line = lines.next_line() => line,
                };

                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(session = %self.id, error = %e, "Console read failed");
                        break;
                    }
                };

                let line = line.trim();
                if line == QUIT {
                    self.trigger.trigger(ShutdownReason::Operator);
                    break;
                }

                // A client that stops reading can park the write forever.
                let exchange = async {
                    let mut reply = String::new();
                    if !line.is_empty() {
                        reply = self.ctx.dispatch(line).await;
                        reply.push_str("\r\n");
                    }
                    reply.push_str(&self.prompt);
                    writer.write_all(reply.as_bytes()).await
                };
                let written = tokio::select! {
                    _ = stop.recv() => break,
                    written = exchange => written,
                };

                if let Err(e) = written {
                    tracing::debug!(session = %self.id, error = %e, "Console write failed");
                    break;
                }
            }
        }

        let _ = writer.shutdown().await;
        metrics::record_session(false);
        tracing::info!(session = %self.id, "Console session closed");
    }
}
