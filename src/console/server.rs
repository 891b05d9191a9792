//! Console assembly, start and stop.
//!
//! # States
//! ```text
//! ConsoleBuilder  (registry mutable; builtins + module commands)
//!     → build  → Console         (registry sealed, dispatch available)
//!     → start  → RunningConsole  (listener accepting, if configured)
//!     → stop   → sessions closed, CPU profile stopped
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::{ConsoleConfig, ProfilingConfig};
use crate::console::bridge::ExternalCommand;
use crate::console::command::{Command, ConsoleContext, DebugHook};
use crate::console::registry::CommandRegistry;
use crate::console::session;
use crate::console::ConsoleError;
use crate::gateway::RpcServer;
use crate::lifecycle::{Shutdown, ShutdownTrigger};
use crate::net::Listener;
use crate::profiling::Profiler;

/// Mutable setup phase of the console.
pub struct ConsoleBuilder {
    registry: CommandRegistry,
    config: ConsoleConfig,
    profiling: ProfilingConfig,
    debug_hook: Option<DebugHook>,
}

impl ConsoleBuilder {
    /// A builder with the builtin commands already registered.
    pub fn new(config: &ConsoleConfig, profiling: &ProfilingConfig) -> Self {
        Self {
            registry: CommandRegistry::with_builtins(),
            config: config.clone(),
            profiling: profiling.clone(),
            debug_hook: None,
        }
    }

    /// Register a command implemented in-process.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Result<(), ConsoleError> {
        self.registry.register(Arc::new(command))
    }

    /// Register `handler` on `server` under `name` and expose it as a command.
    ///
    /// The handler may answer with any JSON value; non-strings reach the
    /// operator as `invalid output type`.
    pub fn register_external<F>(
        &mut self,
        name: &str,
        help: &str,
        handler: F,
        server: &RpcServer,
    ) -> Result<(), ConsoleError>
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        if self.registry.contains(name) {
            return Err(ConsoleError::DuplicateCommand(name.to_string()));
        }
        server.register(name, handler)?;

        let command = ExternalCommand::new(name, help, Arc::new(server.client()));
        self.registry.register(Arc::new(command))?;
        tracing::debug!(command = name, "External console command registered");
        Ok(())
    }

    /// Like [`register_external`](Self::register_external) for handlers that
    /// take and return text.
    pub fn register_text_external<F>(
        &mut self,
        name: &str,
        help: &str,
        handler: F,
        server: &RpcServer,
    ) -> Result<(), ConsoleError>
    where
        F: Fn(&[String]) -> Result<String, String> + Send + Sync + 'static,
    {
        self.register_external(
            name,
            help,
            move |args: Vec<Value>| {
                let args: Vec<String> = args
                    .into_iter()
                    .map(|arg| match arg {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                handler(&args).map(Value::String)
            },
            server,
        )
    }

    /// Install the hook `debug` runs. Replaces any previous hook.
    pub fn set_debug_hook(&mut self, hook: DebugHook) {
        self.debug_hook = Some(hook);
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Seal the registry.
    pub fn build(self) -> Console {
        let profiler = Profiler::new(&self.profiling);
        Console {
            ctx: Arc::new(ConsoleContext::new(self.registry, profiler, self.debug_hook)),
            config: self.config,
        }
    }
}

/// A console whose command set is fixed.
#[derive(Clone)]
pub struct Console {
    ctx: Arc<ConsoleContext>,
    config: ConsoleConfig,
}

impl Console {
    /// Run one input line and return its reply.
    pub async fn dispatch(&self, line: &str) -> String {
        self.ctx.dispatch(line).await
    }

    pub fn context(&self) -> &ConsoleContext {
        &self.ctx
    }

    /// Begin accepting input. Without a bind address only `dispatch` serves.
    pub async fn start(self, trigger: ShutdownTrigger) -> Result<RunningConsole, ConsoleError> {
        let shutdown = Shutdown::new();

        let (accept_task, local_addr) = match &self.config.bind_address {
            None => {
                tracing::info!("Console started without a network listener");
                (None, None)
            }
            Some(address) => {
                let listener = Listener::bind(address, self.config.max_connections).await?;
                let local_addr = listener.local_addr().ok();
                let task = tokio::spawn(session::accept_loop(
                    listener,
                    Arc::clone(&self.ctx),
                    self.config.prompt.clone(),
                    trigger,
                    shutdown.clone(),
                ));
                tracing::info!(address = ?local_addr, "Console started");
                (Some(task), local_addr)
            }
        };

        Ok(RunningConsole {
            console: self,
            shutdown,
            accept_task,
            local_addr,
        })
    }
}

/// A started console.
pub struct RunningConsole {
    console: Console,
    shutdown: Shutdown,
    accept_task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl RunningConsole {
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Address the listener is bound to, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Close the listener and every session, then stop any CPU profile.
    pub async fn stop(self) -> Result<(), ConsoleError> {
        self.shutdown.trigger();

        let joined = match self.accept_task {
            Some(task) => task.await.map_err(|e| ConsoleError::Task(e.to_string())),
            None => Ok(()),
        };

        if let Some(path) = self.console.ctx.profiler().stop_cpu().await {
            tracing::info!(path = %path.display(), "CPU profile closed on console stop");
        }

        tracing::info!("Console stopped");
        joined
    }
}
