//! `help`: list every registered command.

use async_trait::async_trait;

use crate::console::command::{Command, ConsoleContext};

/// Closing line naming the transport's pseudo-command.
pub const QUIT_LINE: &str = "quit - exit console";

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn help(&self) -> &str {
        "this help text"
    }

    async fn run(&self, ctx: &ConsoleContext, _args: &[String]) -> String {
        let mut output = String::new();
        for command in ctx.registry().iter() {
            output.push_str(command.name());
            output.push_str(" - ");
            output.push_str(command.help());
            output.push_str("\r\n");
        }
        output.push_str(QUIT_LINE);
        output
    }
}
