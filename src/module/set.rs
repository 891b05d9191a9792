//! Default [`ModuleRegistry`]: modules in a vector, one task each.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::console::ConsoleBuilder;
use crate::lifecycle::Shutdown;
use crate::module::{Module, ModuleError, ModuleRegistry, ModuleSetup};

struct RunningModule {
    module: Arc<dyn Module>,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct ModuleSet {
    pending: Vec<Box<dyn Module>>,
    running: Vec<RunningModule>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules initialized and not yet destroyed.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}

#[async_trait]
impl ModuleRegistry for ModuleSet {
    fn register(&mut self, module: Box<dyn Module>) {
        tracing::debug!(module = module.name(), "Module registered");
        self.pending.push(module);
    }

    fn init(&mut self, console: &mut ConsoleBuilder) -> Result<(), ModuleError> {
        for mut module in std::mem::take(&mut self.pending) {
            let name = module.name().to_string();
            module.on_init(&mut ModuleSetup::new(&name, console))?;

            let module: Arc<dyn Module> = Arc::from(module);
            let shutdown = Shutdown::new();
            let task = tokio::spawn(Arc::clone(&module).run(shutdown.subscribe()));

            tracing::info!(module = %name, "Module initialized");
            self.running.push(RunningModule {
                module,
                shutdown,
                task,
            });
        }
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), ModuleError> {
        let mut failures = Vec::new();

        while let Some(running) = self.running.pop() {
            let name = running.module.name().to_string();

            running.shutdown.trigger();
            if let Err(e) = running.task.await {
                tracing::error!(module = %name, error = %e, "Module task ended abnormally");
                failures.push(ModuleError::Destroy {
                    module: name.clone(),
                    message: e.to_string(),
                });
            }

            let destroyed = catch_unwind(AssertUnwindSafe(|| running.module.on_destroy()))
                .unwrap_or_else(|_| {
                    Err(ModuleError::Destroy {
                        module: name.clone(),
                        message: "on_destroy panicked".to_string(),
                    })
                });
            match destroyed {
                Ok(()) => tracing::info!(module = %name, "Module destroyed"),
                Err(e) => {
                    tracing::error!(module = %name, error = %e, "Module teardown failed");
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModuleError::Teardown(failures))
        }
    }
}
