//! The lifecycle coordinator.
//!
//! # States
//! ```text
//! NotStarted → ModulesRegistered → Initialized → ConsoleRunning
//!            → ShuttingDown → Destroyed
//! ```
//! A startup failure jumps straight to `Destroyed` once initialized modules
//! have been torn down.
//! `ShuttingDown` is entered at most once: `run` consumes the coordinator.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tokio::sync::watch;

use crate::config::ServiceConfig;
use crate::console::{ConsoleBuilder, ConsoleError, DebugHook};
use crate::lifecycle::shutdown::{ShutdownReason, ShutdownRendezvous, ShutdownTrigger};
use crate::lifecycle::signals::ShutdownSignals;
use crate::module::{Module, ModuleError, ModuleRegistry, ModuleSet};

/// Where the coordinator is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    ModulesRegistered,
    Initialized,
    ConsoleRunning,
    ShuttingDown,
    Destroyed,
}

/// Startup failures. Teardown failures never surface here; they are
/// reported per step in [`ShutdownReport`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("module initialization failed: {0}")]
    Init(#[source] ModuleError),

    #[error("console failed to start: {0}")]
    Console(#[source] ConsoleError),
}

/// The fixed teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    DestroyHook,
    ConsoleStop,
    ModuleDestroy,
}

/// How one teardown step went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: TeardownStep,
    /// `Err` carries the logged failure message.
    pub result: Result<(), String>,
}

/// Summary of the single shutdown a coordinator performs.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    /// Steps in execution order. `DestroyHook` is absent when no hook was set.
    pub steps: Vec<StepOutcome>,
}

type DestroyHook = Box<dyn FnOnce() + Send>;

/// Sequences module startup, the console, and teardown.
pub struct Coordinator<R: ModuleRegistry = ModuleSet> {
    config: ServiceConfig,
    registry: R,
    rendezvous: ShutdownRendezvous,
    state: watch::Sender<LifecycleState>,
    on_destroy: Option<DestroyHook>,
    debug_hook: Option<DebugHook>,
    watch_signals: bool,
}

impl Coordinator<ModuleSet> {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_registry(config, ModuleSet::new())
    }
}

impl<R: ModuleRegistry> Coordinator<R> {
    /// A coordinator driving a caller-supplied module registry.
    pub fn with_registry(config: ServiceConfig, registry: R) -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self {
            config,
            registry,
            rendezvous: ShutdownRendezvous::new(),
            state,
            on_destroy: None,
            debug_hook: None,
            watch_signals: true,
        }
    }

    /// Hook run first during teardown.
    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_destroy = Some(Box::new(hook));
        self
    }

    /// Hook the `debug` command runs. A module may replace it during init.
    pub fn debug_hook(mut self, hook: DebugHook) -> Self {
        self.debug_hook = Some(hook);
        self
    }

    /// Whether to listen for OS termination signals (on by default).
    pub fn watch_signals(mut self, enabled: bool) -> Self {
        self.watch_signals = enabled;
        self
    }

    /// A handle that requests shutdown through the rendezvous.
    pub fn trigger(&self) -> ShutdownTrigger {
        self.rendezvous.trigger()
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        tracing::info!(from = ?previous, to = ?next, "Lifecycle transition");
    }

    /// Start everything, block until shutdown is requested, tear down.
    pub async fn run(mut self, modules: Vec<Box<dyn Module>>) -> Result<ShutdownReport, LifecycleError> {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-console starting up");

        for module in modules {
            self.registry.register(module);
        }
        self.transition(LifecycleState::ModulesRegistered);

        let mut builder = ConsoleBuilder::new(&self.config.console, &self.config.profiling);
        if let Some(hook) = self.debug_hook.take() {
            builder.set_debug_hook(hook);
        }

        if let Err(e) = self.registry.init(&mut builder) {
            tracing::error!(error = %e, "Startup aborted during module initialization");
            self.destroy_after_failed_startup().await;
            return Err(LifecycleError::Init(e));
        }
        self.transition(LifecycleState::Initialized);

        let console = match builder.build().start(self.rendezvous.trigger()).await {
            Ok(console) => console,
            Err(e) => {
                tracing::error!(error = %e, "Startup aborted: console did not start");
                self.destroy_after_failed_startup().await;
                return Err(LifecycleError::Console(e));
            }
        };

        // Handlers are in place before anyone can observe ConsoleRunning.
        let watcher = if self.watch_signals {
            self.spawn_signal_watcher()
        } else {
            None
        };
        self.transition(LifecycleState::ConsoleRunning);

        let reason = self.rendezvous.wait().await;
        self.transition(LifecycleState::ShuttingDown);
        tracing::info!(reason = %reason, "Closing down");

        if let Some(watcher) = watcher {
            watcher.abort();
        }

        let mut steps = Vec::with_capacity(3);

        if let Some(hook) = self.on_destroy.take() {
            let result = catch_unwind(AssertUnwindSafe(hook))
                .map_err(|_| "destroy hook panicked".to_string());
            steps.push(self.record(TeardownStep::DestroyHook, result));
        }

        let result = console.stop().await.map_err(|e| e.to_string());
        steps.push(self.record(TeardownStep::ConsoleStop, result));

        let result = self.registry.destroy().await.map_err(|e| e.to_string());
        steps.push(self.record(TeardownStep::ModuleDestroy, result));

        self.transition(LifecycleState::Destroyed);
        tracing::info!("Shutdown complete");

        Ok(ShutdownReport { reason, steps })
    }

    fn record(&self, step: TeardownStep, result: Result<(), String>) -> StepOutcome {
        if let Err(message) = &result {
            tracing::error!(step = ?step, error = %message, "Teardown step failed");
        }
        StepOutcome { step, result }
    }

    fn spawn_signal_watcher(&self) -> Option<tokio::task::JoinHandle<()>> {
        let mut signals = match ShutdownSignals::install() {
            Ok(signals) => signals,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return None;
            }
        };
        let trigger = self.rendezvous.trigger();
        Some(tokio::spawn(async move {
            let signal = signals.recv().await;
            tracing::info!(signal, "Termination signal received");
            trigger.trigger(ShutdownReason::Signal);
        }))
    }

    async fn destroy_after_failed_startup(&mut self) {
        if let Err(e) = self.registry.destroy().await {
            tracing::error!(error = %e, "Module teardown after failed startup reported errors");
        }
        self.transition(LifecycleState::Destroyed);
    }
}
