//! Built-in diagnostic commands.

pub mod cpuprof;
pub mod debug;
pub mod help;
pub mod prof;

use std::sync::Arc;

use crate::console::command::Command;

pub use cpuprof::CpuProfCommand;
pub use debug::DebugCommand;
pub use help::HelpCommand;
pub use prof::ProfCommand;

/// Every builtin, in the order `help` lists them.
pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(HelpCommand),
        Arc::new(CpuProfCommand),
        Arc::new(ProfCommand),
        Arc::new(DebugCommand),
    ]
}
