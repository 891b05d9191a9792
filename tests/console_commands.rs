//! Command behavior through `Console::dispatch`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use service_console::console::{builtin, NOT_FOUND};
use service_console::gateway::RpcServer;
use service_console::lifecycle::Shutdown;

mod common;

#[tokio::test]
async fn test_help_lists_commands_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let server = RpcServer::default();
    let mut builder = common::builder_in(dir.path());
    builder
        .register_text_external("backup", "dump the database", |_| Ok("done".into()), &server)
        .unwrap();
    let console = builder.build();

    let help = console.dispatch("help").await;
    let lines: Vec<&str> = help.lines().collect();

    assert_eq!(
        lines,
        vec![
            "help - this help text",
            "cpuprof - CPU profiling for the current process",
            "prof - writes a profile snapshot",
            "debug - dump where each worker last was (runs the debug hook)",
            "backup - dump the database",
            "quit - exit console",
        ]
    );
    assert_eq!(console.dispatch("HELP").await, help);
}

#[tokio::test]
async fn test_unknown_command() {
    let dir = tempfile::tempdir().unwrap();
    let console = common::builder_in(dir.path()).build();
    assert_eq!(console.dispatch("quit").await, NOT_FOUND);
    assert_eq!(console.dispatch("helpme").await, NOT_FOUND);
}

#[tokio::test]
async fn test_cpuprof_usage() {
    let dir = tempfile::tempdir().unwrap();
    let console = common::builder_in(dir.path()).build();

    let bare = console.dispatch("cpuprof").await;
    let bogus = console.dispatch("cpuprof pause").await;
    assert_eq!(bare, builtin::cpuprof::USAGE);
    assert_eq!(bare, bogus);
    assert_eq!(console.dispatch("cpuprof START").await, bare);
}

#[tokio::test]
async fn test_cpuprof_start_stop() {
    let dir = tempfile::tempdir().unwrap();
    let console = common::builder_in(dir.path()).build();

    // Stop before any start is a no-op.
    assert_eq!(console.dispatch("cpuprof stop").await, "");

    let file = console.dispatch("cpuprof start").await;
    assert!(file.ends_with(".cpuprof"), "unexpected reply: {}", file);
    assert!(Path::new(&file).exists());
    assert!(Path::new(&file).starts_with(dir.path()));

    assert_eq!(
        console.dispatch("cpuprof start").await,
        "cpu profiling already in use"
    );

    assert_eq!(console.dispatch("cpuprof stop").await, "");
    assert_eq!(console.dispatch("cpuprof stop").await, "");
    assert!(!std::fs::read_to_string(&file).unwrap().is_empty());
}

#[tokio::test]
async fn test_cpuprof_unwritable_dir() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let console = common::builder_in(&missing).build();

    let reply = console.dispatch("cpuprof start").await;
    assert!(!reply.ends_with(".cpuprof"));
    assert!(!reply.is_empty());
    assert_eq!(console.dispatch("cpuprof stop").await, "");
}

#[tokio::test]
async fn test_prof_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let console = common::builder_in(dir.path()).build();

    for (kind, suffix) in [
        ("goroutine", ".gprof"),
        ("heap", ".hprof"),
        ("thread", ".tprof"),
        ("block", ".bprof"),
    ] {
        let file = console.dispatch(&format!("prof {}", kind)).await;
        assert!(file.ends_with(suffix), "{} gave {}", kind, file);

        let body: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(body["kind"], kind);
    }

    assert_eq!(console.dispatch("prof").await, builtin::prof::USAGE);
    assert_eq!(console.dispatch("prof threadcreate").await, builtin::prof::USAGE);
}

#[tokio::test]
async fn test_debug_runs_hook_when_present() {
    let dir = tempfile::tempdir().unwrap();

    let console = common::builder_in(dir.path()).build();
    assert_eq!(console.dispatch("debug").await, builtin::debug::DONE);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut builder = common::builder_in(dir.path());
    builder.set_debug_hook(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    let console = builder.build();

    assert_eq!(console.dispatch("debug").await, builtin::debug::DONE);
    assert_eq!(console.dispatch("DEBUG now").await, builtin::debug::DONE);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_external_command_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(RpcServer::default());
    let mut builder = common::builder_in(dir.path());

    builder
        .register_external("rows", "count rows", |_| Ok(json!(42)), &server)
        .unwrap();
    builder
        .register_external("vacuum", "compact", |_| Err("table locked".into()), &server)
        .unwrap();
    builder
        .register_text_external("echo", "echo", |args| Ok(args.join(",")), &server)
        .unwrap();
    let console = builder.build();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let serving = Arc::clone(&server);
    let task = tokio::spawn(async move { serving.serve(rx).await });

    assert_eq!(console.dispatch("rows").await, "invalid output type");
    assert_eq!(console.dispatch("vacuum").await, "table locked");
    assert_eq!(console.dispatch("ECHO a b  c").await, "a,b,c");

    shutdown.trigger();
    task.await.unwrap();

    assert_eq!(console.dispatch("echo late").await, "call gateway closed");
}

#[tokio::test]
async fn test_concurrent_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(RpcServer::default());
    let mut builder = common::builder_in(dir.path());
    builder
        .register_text_external("echo", "echo", |args| Ok(args.join(" ")), &server)
        .unwrap();
    let console = builder.build();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let serving = Arc::clone(&server);
    let task = tokio::spawn(async move { serving.serve(rx).await });

    let mut handles = Vec::new();
    for i in 0..16 {
        let console = console.clone();
        handles.push(tokio::spawn(async move {
            console.dispatch(&format!("echo {}", i)).await
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), i.to_string());
    }

    shutdown.trigger();
    task.await.unwrap();
}
