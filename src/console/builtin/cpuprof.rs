//! `cpuprof start|stop`: continuous CPU sampling.

use async_trait::async_trait;

use crate::console::command::{Command, ConsoleContext};

pub const USAGE: &str = "cpuprof samples CPU usage of the current process into a file\r\n\
\r\n\
Usage: cpuprof start|stop\r\n\
\x20 start - enables CPU profiling\r\n\
\x20 stop  - stops the current CPU profile";

pub struct CpuProfCommand;

#[async_trait]
impl Command for CpuProfCommand {
    fn name(&self) -> &str {
        "cpuprof"
    }

    fn help(&self) -> &str {
        "CPU profiling for the current process"
    }

    async fn run(&self, ctx: &ConsoleContext, args: &[String]) -> String {
        match args.first().map(String::as_str) {
            Some("start") => match ctx.profiler().start_cpu() {
                Ok(path) => path.display().to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "cpuprof start failed");
                    e.to_string()
                }
            },
            Some("stop") => {
                ctx.profiler().stop_cpu().await;
                String::new()
            }
            _ => USAGE.to_string(),
        }
    }
}
