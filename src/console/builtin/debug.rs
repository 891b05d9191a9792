//! `debug`: run the installed diagnostic hook, if any.

use std::panic::{catch_unwind, AssertUnwindSafe};

use async_trait::async_trait;

use crate::console::command::{Command, ConsoleContext};

/// Reply of `debug`, whatever the hook did.
pub const DONE: &str = "ok";

pub struct DebugCommand;

#[async_trait]
impl Command for DebugCommand {
    fn name(&self) -> &str {
        "debug"
    }

    fn help(&self) -> &str {
        "dump where each worker last was (runs the debug hook)"
    }

    async fn run(&self, ctx: &ConsoleContext, _args: &[String]) -> String {
        if let Some(hook) = ctx.debug_hook() {
            if catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
                tracing::error!("Debug hook panicked");
            }
        }
        DONE.to_string()
    }
}
