//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use service_console::config::{ConsoleConfig, ProfilingConfig};
use service_console::console::ConsoleBuilder;
use service_console::gateway::RpcServer;
use service_console::module::{Module, ModuleError, ModuleSetup};

#[allow(dead_code)]
pub const PROMPT: &str = "> ";

/// Console builder writing profiles into `dir`.
#[allow(dead_code)]
pub fn builder_in(dir: &Path) -> ConsoleBuilder {
    let profiling = ProfilingConfig {
        profile_dir: dir.to_string_lossy().into_owned(),
        cpu_sample_interval_ms: 2,
    };
    ConsoleBuilder::new(&ConsoleConfig::default(), &profiling)
}

/// Console config listening on an ephemeral local port.
#[allow(dead_code)]
pub fn tcp_console_config() -> ConsoleConfig {
    ConsoleConfig {
        bind_address: Some("127.0.0.1:0".into()),
        max_connections: 4,
        prompt: PROMPT.into(),
    }
}

/// A module exposing one raw JSON handler under a chosen name.
#[allow(dead_code)]
pub struct HandlerModule {
    pub command: &'static str,
    pub handler: Arc<dyn Fn(Vec<Value>) -> Result<Value, String> + Send + Sync>,
    pub rpc: Arc<RpcServer>,
}

#[allow(dead_code)]
impl HandlerModule {
    pub fn new<F>(command: &'static str, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            command,
            handler: Arc::new(handler),
            rpc: Arc::new(RpcServer::default()),
        }
    }
}

#[async_trait]
impl Module for HandlerModule {
    fn name(&self) -> &str {
        self.command
    }

    fn on_init(&mut self, setup: &mut ModuleSetup<'_>) -> Result<(), ModuleError> {
        let handler = Arc::clone(&self.handler);
        setup.console().register_external(
            self.command,
            "test handler",
            move |args| handler(args),
            &self.rpc,
        )?;
        Ok(())
    }

    async fn run(self: Arc<Self>, shutdown: broadcast::Receiver<()>) {
        self.rpc.serve(shutdown).await;
    }
}

/// Minimal operator client for the line transport.
#[allow(dead_code)]
pub struct Operator {
    stream: TcpStream,
}

#[allow(dead_code)]
impl Operator {
    /// Connect and swallow the first prompt.
    pub async fn connect(addr: SocketAddr) -> Self {
        let mut operator = Self {
            stream: TcpStream::connect(addr).await.unwrap(),
        };
        assert_eq!(operator.read_reply().await, Some(String::new()));
        operator
    }

    /// Send one line and return the reply that precedes the next prompt.
    pub async fn send(&mut self, line: &str) -> Option<String> {
        self.stream
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
        self.read_reply().await
    }

    /// Read until the prompt; `None` if the server closed the connection first.
    pub async fn read_reply(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            if buf.ends_with(PROMPT.as_bytes()) {
                let text = String::from_utf8_lossy(&buf[..buf.len() - PROMPT.len()]);
                return Some(text.trim_end_matches("\r\n").to_string());
            }
            let n = self.stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}
