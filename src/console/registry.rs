//! Ordered, case-insensitive command table.

use std::sync::Arc;

use crate::console::builtin;
use crate::console::command::Command;
use crate::console::ConsoleError;

/// Commands in registration order; names unique ignoring ASCII case.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `help`, `cpuprof`, `prof` and `debug`, in that order.
    pub fn with_builtins() -> Self {
        Self {
            commands: builtin::all(),
        }
    }

    /// Append `command`, refusing a name already present in any case.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<(), ConsoleError> {
        if self.contains(command.name()) {
            return Err(ConsoleError::DuplicateCommand(command.name().to_string()));
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Case-insensitive exact match.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
