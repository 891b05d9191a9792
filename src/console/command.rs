//! The command capability and the context commands run against.

use std::sync::Arc;

use async_trait::async_trait;

use crate::console::registry::CommandRegistry;
use crate::console::NOT_FOUND;
use crate::observability::metrics;
use crate::profiling::Profiler;

/// Zero-argument diagnostic callback run by `debug`.
pub type DebugHook = Arc<dyn Fn() + Send + Sync>;

/// A console command.
///
/// Implementations must tolerate concurrent `run` calls.
#[async_trait]
pub trait Command: Send + Sync {
    /// Unique name, compared case-insensitively.
    fn name(&self) -> &str;

    /// One-line description shown by `help`.
    fn help(&self) -> &str;

    /// Execute with the tokens that followed the name.
    async fn run(&self, ctx: &ConsoleContext, args: &[String]) -> String;
}

/// Everything a command may consult while running. Immutable once built.
pub struct ConsoleContext {
    registry: CommandRegistry,
    profiler: Profiler,
    debug_hook: Option<DebugHook>,
}

impl ConsoleContext {
    pub(crate) fn new(
        registry: CommandRegistry,
        profiler: Profiler,
        debug_hook: Option<DebugHook>,
    ) -> Self {
        Self {
            registry,
            profiler,
            debug_hook,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn debug_hook(&self) -> Option<&DebugHook> {
        self.debug_hook.as_ref()
    }

    /// Split `line` on whitespace, resolve the first token and run it.
    ///
    /// A blank line yields an empty reply.
    pub async fn dispatch(&self, line: &str) -> String {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return String::new();
        };
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let Some(command) = self.registry.lookup(name) else {
            tracing::debug!(command = name, "Unknown console command");
            metrics::record_command(None);
            return NOT_FOUND.to_string();
        };

        tracing::debug!(command = command.name(), args = ?args, "Running console command");
        metrics::record_command(Some(command.name()));
        command.run(self, &args).await
    }
}
