//! Point-in-time profile snapshots.

use std::backtrace::Backtrace;

use serde_json::{json, Value};

use crate::profiling::{alloc, procfs};

/// The snapshot kinds `prof` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// Async tasks and runtime workers (`goroutine`).
    Tasks,
    /// Memory usage and allocation counters.
    Heap,
    /// OS threads of the process.
    Thread,
    /// Per-thread context switches, i.e. time spent blocked.
    Block,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Tasks,
        ProfileKind::Heap,
        ProfileKind::Thread,
        ProfileKind::Block,
    ];

    /// Parse the operator-facing subcommand.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "goroutine" => Some(ProfileKind::Tasks),
            "heap" => Some(ProfileKind::Heap),
            "thread" => Some(ProfileKind::Thread),
            "block" => Some(ProfileKind::Block),
            _ => None,
        }
    }

    pub fn arg(self) -> &'static str {
        match self {
            ProfileKind::Tasks => "goroutine",
            ProfileKind::Heap => "heap",
            ProfileKind::Thread => "thread",
            ProfileKind::Block => "block",
        }
    }

    /// Artifact file extension.
    pub fn suffix(self) -> &'static str {
        match self {
            ProfileKind::Tasks => "gprof",
            ProfileKind::Heap => "hprof",
            ProfileKind::Thread => "tprof",
            ProfileKind::Block => "bprof",
        }
    }

    /// Gather the snapshot body.
    pub fn capture(self) -> Value {
        let captured_at = chrono::Local::now().to_rfc3339();
        let data = match self {
            ProfileKind::Tasks => capture_tasks(),
            ProfileKind::Heap => capture_heap(),
            ProfileKind::Thread => capture_threads(),
            ProfileKind::Block => capture_blocking(),
        };

        json!({
            "kind": self.arg(),
            "captured_at": captured_at,
            "pid": std::process::id(),
            "data": data,
        })
    }
}

fn capture_tasks() -> Value {
    let runtime = tokio::runtime::Handle::try_current().ok().map(|handle| {
        let metrics = handle.metrics();
        json!({
            "workers": metrics.num_workers(),
            "alive_tasks": metrics.num_alive_tasks(),
        })
    });

    let backtrace: Vec<String> = Backtrace::force_capture()
        .to_string()
        .lines()
        .map(str::to_string)
        .collect();

    json!({
        "runtime": runtime,
        "capturing_thread": std::thread::current().name().unwrap_or("<unnamed>"),
        "backtrace": backtrace,
    })
}

fn capture_heap() -> Value {
    json!({
        "memory": procfs::memory_status(),
        "allocations": alloc::allocation_stats(),
    })
}

fn capture_threads() -> Value {
    let threads: Vec<Value> = procfs::threads()
        .into_iter()
        .map(|t| json!({ "tid": t.tid, "name": t.name }))
        .collect();

    json!({
        "count": threads.len(),
        "threads": threads,
    })
}

fn capture_blocking() -> Value {
    let threads = procfs::threads();
    let voluntary: u64 = threads.iter().filter_map(|t| t.voluntary_switches).sum();
    let involuntary: u64 = threads.iter().filter_map(|t| t.involuntary_switches).sum();

    json!({
        "voluntary_switches": voluntary,
        "involuntary_switches": involuntary,
        "threads": threads,
    })
}
