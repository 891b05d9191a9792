//! Continuous CPU sampling.
//!
//! # States
//! ```text
//! Idle → Profiling: start (file created, sampler thread spawned)
//! Profiling → Idle: stop (sampler signalled, joined, file flushed)
//! ```
//!
//! The sampler is a plain OS thread so it keeps ticking even when every
//! runtime worker is busy.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::profiling::procfs;
use crate::profiling::ProfileError;

/// One line of a `.cpuprof` artifact.
#[derive(Debug, Serialize)]
struct CpuSample {
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_ticks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_ticks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threads: Option<u64>,
}

impl CpuSample {
    fn take(started: Instant) -> Self {
        let stat = procfs::process_stat();
        Self {
            elapsed_ms: started.elapsed().as_millis() as u64,
            user_ticks: stat.as_ref().map(|s| s.user_ticks),
            system_ticks: stat.as_ref().map(|s| s.system_ticks),
            threads: stat.as_ref().map(|s| s.threads),
        }
    }
}

struct ActiveProfile {
    path: PathBuf,
    stop: mpsc::Sender<()>,
    sampler: JoinHandle<()>,
}

enum CpuState {
    Idle,
    Profiling(ActiveProfile),
}

/// Process-wide CPU sampling state.
pub struct CpuProfiler {
    state: Mutex<CpuState>,
    interval: Duration,
}

impl CpuProfiler {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Mutex::new(CpuState::Idle),
            interval,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.lock(), CpuState::Profiling(_))
    }

    /// Create `path` and start sampling into it.
    pub fn start(&self, path: &Path) -> Result<(), ProfileError> {
        let mut state = self.state.lock();
        if matches!(*state, CpuState::Profiling(_)) {
            return Err(ProfileError::AlreadyProfiling);
        }

        let file = File::create(path)?;
        let (stop, stopped) = mpsc::channel();
        let interval = self.interval;

        let sampler = std::thread::Builder::new()
            .name("cpu-profiler".into())
            .spawn(move || run_sampler(BufWriter::new(file), interval, stopped))?;

        *state = CpuState::Profiling(ActiveProfile {
            path: path.to_path_buf(),
            stop,
            sampler,
        });
        Ok(())
    }

    /// Stop sampling; a no-op when idle.
    pub async fn stop(&self) -> Option<PathBuf> {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, CpuState::Idle)
        };
        let active = match previous {
            CpuState::Idle => return None,
            CpuState::Profiling(active) => active,
        };

        let _ = active.stop.send(());
        let sampler = active.sampler;
        match tokio::task::spawn_blocking(move || sampler.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => tracing::error!("CPU sampler thread panicked"),
            Err(e) => tracing::error!(error = %e, "Failed to join CPU sampler"),
        }

        Some(active.path)
    }
}

fn run_sampler(mut out: BufWriter<File>, interval: Duration, stopped: mpsc::Receiver<()>) {
    let started = Instant::now();

    loop {
        if let Err(e) = write_sample(&mut out, &CpuSample::take(started)) {
            tracing::error!(error = %e, "Failed to write CPU sample; sampler exiting");
            return;
        }

        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            // Stop requested, or the owner dropped the sender.
            _ => break,
        }
    }

    if let Err(e) = write_sample(&mut out, &CpuSample::take(started)) {
        tracing::warn!(error = %e, "Failed to write final CPU sample");
    }
}

fn write_sample(out: &mut BufWriter<File>, sample: &CpuSample) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, sample)?;
    out.write_all(b"\n")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_stop_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle.cpuprof");
        let profiler = CpuProfiler::new(Duration::from_millis(1));

        profiler.start(&path).unwrap();
        assert!(profiler.is_active());
        assert!(path.exists());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(profiler.stop().await, Some(path.clone()));
        assert!(!profiler.is_active());

        let body = std::fs::read_to_string(&path).unwrap();
        let first = body.lines().next().unwrap();
        let sample: serde_json::Value = serde_json::from_str(first).unwrap();
        assert!(sample.get("elapsed_ms").is_some());
    }

    #[tokio::test]
    async fn test_second_start_refused() {
        let dir = tempfile::tempdir().unwrap();
        let profiler = CpuProfiler::new(Duration::from_millis(5));

        profiler.start(&dir.path().join("a.cpuprof")).unwrap();
        let err = profiler.start(&dir.path().join("b.cpuprof")).unwrap_err();
        assert!(matches!(err, ProfileError::AlreadyProfiling));
        assert!(!dir.path().join("b.cpuprof").exists());

        profiler.stop().await;
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let profiler = CpuProfiler::new(Duration::from_millis(5));
        assert_eq!(profiler.stop().await, None);
        assert_eq!(profiler.stop().await, None);
    }
}
