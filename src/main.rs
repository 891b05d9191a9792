//! Service console (v1)
//!
//! Hosts modules behind an operator console and shuts them down in order.
//!
//! # Architecture Overview
//!
//! ```text
//!   operator ──tcp──▶ console session ──▶ CommandRegistry ──▶ builtin command
//!                                                       └──▶ ExternalCommand
//!                                                                 │ gateway
//!                                                                 ▼
//!   SIGINT/SIGTERM ──┐                                      module handler
//!   `quit`         ──┼──▶ rendezvous ──▶ coordinator teardown:
//!                    │                   hook → console stop → module destroy
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::broadcast;

use service_console::config::{load_config, ConfigOverrides};
use service_console::gateway::RpcServer;
use service_console::lifecycle::Coordinator;
use service_console::module::{Module, ModuleError, ModuleSetup};
use service_console::observability::init_logging;

#[cfg(feature = "alloc-tracking")]
#[global_allocator]
static GLOBAL: service_console::profiling::TrackingAllocator =
    service_console::profiling::TrackingAllocator;

#[derive(Parser)]
#[command(name = "service-console")]
#[command(about = "Long-running service with an operator console", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Console bind address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory for profile artifacts, overriding the config file.
    #[arg(short, long)]
    profile_dir: Option<String>,
}

/// Demo module contributing `uptime` and `echo` through the call gateway.
struct UptimeModule {
    started: Instant,
    rpc: Arc<RpcServer>,
}

impl UptimeModule {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            rpc: Arc::new(RpcServer::default()),
        }
    }
}

#[async_trait]
impl Module for UptimeModule {
    fn name(&self) -> &str {
        "uptime"
    }

    fn on_init(&mut self, setup: &mut ModuleSetup<'_>) -> Result<(), ModuleError> {
        let started = self.started;
        setup.console().register_text_external(
            "uptime",
            "how long the service has been running",
            move |_| Ok(format!("{}s", started.elapsed().as_secs())),
            &self.rpc,
        )?;
        setup.console().register_text_external(
            "echo",
            "repeat the arguments back",
            |args| Ok(args.join(" ")),
            &self.rpc,
        )?;
        Ok(())
    }

    async fn run(self: Arc<Self>, shutdown: broadcast::Receiver<()>) {
        self.rpc.serve(shutdown).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        profile_dir: cli.profile_dir,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;

    init_logging(&config.observability);

    tracing::info!(
        bind_address = ?config.console.bind_address,
        profile_dir = %config.profiling.profile_dir,
        "Configuration loaded"
    );

    let report = Coordinator::new(config)
        .on_destroy(|| tracing::info!("Running global teardown hook"))
        .run(vec![Box::new(UptimeModule::new())])
        .await?;

    let failed = report.steps.iter().filter(|s| s.result.is_err()).count();
    tracing::info!(reason = %report.reason, failed_steps = failed, "Exited");
    Ok(())
}
