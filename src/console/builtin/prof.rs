//! `prof goroutine|heap|thread|block`: one-shot snapshots.

use async_trait::async_trait;

use crate::console::command::{Command, ConsoleContext};
use crate::profiling::ProfileKind;

pub const USAGE: &str = "prof writes a point-in-time profile snapshot to a file\r\n\
\r\n\
Usage: prof goroutine|heap|thread|block\r\n\
\x20 goroutine - async runtime tasks and workers, with the capturing stack\r\n\
\x20 heap      - memory usage and allocation counters\r\n\
\x20 thread    - the OS threads of the process\r\n\
\x20 block     - per-thread context switches spent waiting";

pub struct ProfCommand;

#[async_trait]
impl Command for ProfCommand {
    fn name(&self) -> &str {
        "prof"
    }

    fn help(&self) -> &str {
        "writes a profile snapshot"
    }

    async fn run(&self, ctx: &ConsoleContext, args: &[String]) -> String {
        let Some(kind) = args.first().and_then(|arg| ProfileKind::from_arg(arg)) else {
            return USAGE.to_string();
        };

        match ctx.profiler().snapshot(kind).await {
            Ok(path) => path.display().to_string(),
            Err(e) => {
                tracing::warn!(kind = kind.arg(), error = %e, "prof snapshot failed");
                e.to_string()
            }
        }
    }
}
