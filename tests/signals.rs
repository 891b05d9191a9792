//! Termination signals reaching the rendezvous.
//!
//! Kept in its own test binary: the SIGTERM below is delivered to the whole
//! process.
#![cfg(unix)]

use std::time::Duration;

use serde_json::json;

use service_console::config::ServiceConfig;
use service_console::lifecycle::{Coordinator, LifecycleState, ShutdownReason, TeardownStep};

mod common;

#[tokio::test]
async fn test_sigterm_racing_internal_trigger_tears_down_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::default();
    config.profiling.profile_dir = dir.path().to_string_lossy().into_owned();

    let coordinator = Coordinator::new(config);
    let trigger = coordinator.trigger();
    let mut state = coordinator.state();
    let module = common::HandlerModule::new("rows", |args| Ok(json!(args.len().to_string())));
    let run = tokio::spawn(coordinator.run(vec![Box::new(module)]));

    state
        .wait_for(|s| *s == LifecycleState::ConsoleRunning)
        .await
        .unwrap();

    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    trigger.trigger(ShutdownReason::Internal);

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(
        matches!(report.reason, ShutdownReason::Signal | ShutdownReason::Internal),
        "unexpected reason: {}",
        report.reason
    );
    let steps: Vec<TeardownStep> = report.steps.iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![TeardownStep::ConsoleStop, TeardownStep::ModuleDestroy]);
    assert!(report.steps.iter().all(|s| s.result.is_ok()));
    assert_eq!(*state.borrow(), LifecycleState::Destroyed);

    // Only one shutdown per coordinator.
    assert!(!trigger.trigger(ShutdownReason::Internal));
}
