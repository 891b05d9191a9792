//! Module runtime.
//!
//! # Data Flow
//! ```text
//! register(module)  →  pending, in order
//! init(console)     →  on_init in order (commands, hooks registered)
//!                   →  run task spawned per module
//! destroy()         →  reverse order: stop run task, await it, on_destroy
//! ```
//!
//! # Design Decisions
//! - The coordinator only sees the `ModuleRegistry` trait, so tests and
//!   embedders can substitute their own registry
//! - Teardown is best-effort: one module failing never skips the others

pub mod set;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::console::{ConsoleBuilder, ConsoleError, DebugHook};

pub use set::ModuleSet;

/// Errors raised by modules and the module registry.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module {module} failed to initialize: {message}")]
    Init { module: String, message: String },

    #[error("module {module} failed to tear down: {message}")]
    Destroy { module: String, message: String },

    #[error(transparent)]
    Console(#[from] ConsoleError),

    #[error("{} module(s) failed to tear down", .0.len())]
    Teardown(Vec<ModuleError>),
}

/// Setup-time access a module gets during `on_init`.
pub struct ModuleSetup<'a> {
    module: &'a str,
    console: &'a mut ConsoleBuilder,
}

impl<'a> ModuleSetup<'a> {
    pub fn new(module: &'a str, console: &'a mut ConsoleBuilder) -> Self {
        Self { module, console }
    }

    /// Name of the module being initialized.
    pub fn module(&self) -> &str {
        self.module
    }

    /// The console under construction.
    pub fn console(&mut self) -> &mut ConsoleBuilder {
        self.console
    }

    /// Install the hook the `debug` command runs.
    pub fn set_debug_hook(&mut self, hook: DebugHook) {
        tracing::debug!(module = self.module, "Debug hook installed");
        self.console.set_debug_hook(hook);
    }
}

/// An independently developed subsystem hosted by the service.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Called once, in registration order, before the console starts.
    fn on_init(&mut self, setup: &mut ModuleSetup<'_>) -> Result<(), ModuleError>;

    /// Body of the module's own task; must return once `shutdown` fires.
    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let _ = shutdown.recv().await;
    }

    /// Called once after `run` has returned.
    fn on_destroy(&self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// The collaborator that owns modules on the coordinator's behalf.
#[async_trait]
pub trait ModuleRegistry: Send {
    fn register(&mut self, module: Box<dyn Module>);

    fn init(&mut self, console: &mut ConsoleBuilder) -> Result<(), ModuleError>;

    async fn destroy(&mut self) -> Result<(), ModuleError>;
}
