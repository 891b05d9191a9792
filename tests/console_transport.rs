//! The line transport: prompt, replies, `quit`, stop.

use std::time::Duration;

use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use service_console::config::ProfilingConfig;
use service_console::console::{ConsoleBuilder, NOT_FOUND};
use service_console::lifecycle::{
    Coordinator, LifecycleState, ShutdownReason, ShutdownRendezvous, TeardownStep,
};

mod common;

#[tokio::test]
async fn test_session_round_trip_and_quit() {
    let mut rendezvous = ShutdownRendezvous::new();
    let console = ConsoleBuilder::new(&common::tcp_console_config(), &ProfilingConfig::default())
        .build();
    let running = console.start(rendezvous.trigger()).await.unwrap();
    let addr = running.local_addr().unwrap();

    let mut operator = common::Operator::connect(addr).await;
    assert_eq!(operator.send("").await, Some(String::new()));
    assert_eq!(operator.send("nonsense").await, Some(NOT_FOUND.to_string()));

    let help = operator.send("HELP").await.unwrap();
    assert!(help.starts_with("help - this help text"));
    assert!(help.ends_with("quit - exit console"));

    assert_eq!(operator.send("quit").await, None);
    let reason = tokio::time::timeout(Duration::from_secs(5), rendezvous.wait())
        .await
        .unwrap();
    assert_eq!(reason, ShutdownReason::Operator);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_closes_open_sessions() {
    let rendezvous = ShutdownRendezvous::new();
    let console = ConsoleBuilder::new(&common::tcp_console_config(), &ProfilingConfig::default())
        .build();
    let running = console.start(rendezvous.trigger()).await.unwrap();

    let mut operator = common::Operator::connect(running.local_addr().unwrap()).await;

    tokio::time::timeout(Duration::from_secs(5), running.stop())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(operator.read_reply().await, None);
}

#[tokio::test]
async fn test_stop_returns_while_client_ignores_replies() {
    let rendezvous = ShutdownRendezvous::new();
    let console = ConsoleBuilder::new(&common::tcp_console_config(), &ProfilingConfig::default())
        .build();
    let running = console.start(rendezvous.trigger()).await.unwrap();
    let addr = running.local_addr().unwrap();

    // Flood commands and never read, so the session's writes back up.
    let flood = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = stream.write_all("help\n".repeat(200_000).as_bytes()).await;
        stream
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(5), running.stop()).await;
    assert!(stopped.is_ok(), "console stop blocked on a non-reading client");
    stopped.unwrap().unwrap();

    flood.abort();
}

#[tokio::test]
async fn test_operator_quit_drives_full_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let port = {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        reserved.local_addr().unwrap().port()
    };

    let mut config = service_console::ServiceConfig::default();
    config.console = common::tcp_console_config();
    config.console.bind_address = Some(format!("127.0.0.1:{}", port));
    config.profiling.profile_dir = dir.path().to_string_lossy().into_owned();

    let coordinator = Coordinator::new(config).watch_signals(false);
    let mut state = coordinator.state();
    let module = common::HandlerModule::new("rows", |args| Ok(json!(args.len().to_string())));
    let run = tokio::spawn(coordinator.run(vec![Box::new(module)]));

    state
        .wait_for(|s| *s == LifecycleState::ConsoleRunning)
        .await
        .unwrap();

    let addr = format!("127.0.0.1:{}", port).parse().unwrap();
    let mut operator = common::Operator::connect(addr).await;
    assert_eq!(operator.send("rows a b c").await, Some("3".to_string()));
    assert_eq!(operator.send("quit").await, None);

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(report.reason, ShutdownReason::Operator);
    assert_eq!(report.steps.last().map(|s| s.step), Some(TeardownStep::ModuleDestroy));
}
