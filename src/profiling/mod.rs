//! Process profiling.
//!
//! # Data Flow
//! ```text
//! cpuprof start → cpu.rs spawns a sampler thread → <dir>/<stamp>.cpuprof (JSON lines)
//! cpuprof stop  → sampler thread signalled and joined
//! prof <kind>   → snapshot.rs captures once → <dir>/<stamp>.<suffix> (JSON)
//!                    ↑ procfs.rs (Linux /proc readers), alloc.rs (allocation counters)
//! ```
//!
//! # Design Decisions
//! - Artifacts are named by local wall-clock second, so two captures of the
//!   same kind in one second overwrite each other
//! - CPU profiling is an explicit Idle/Profiling state; a second start is
//!   refused instead of racing the first

pub mod alloc;
pub mod cpu;
pub mod procfs;
pub mod snapshot;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::ProfilingConfig;

#[cfg(feature = "alloc-tracking")]
pub use alloc::TrackingAllocator;
pub use cpu::CpuProfiler;
pub use snapshot::ProfileKind;

/// Errors surfaced by profiling operations.
///
/// `Display` is exactly what an operator sees, so I/O errors pass through
/// unchanged.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Encode(#[from] serde_json::Error),

    #[error("cpu profiling already in use")]
    AlreadyProfiling,
}

/// Timestamp stem used for artifact names: `YYYYMMDD_HH_MM_SS`, local time.
pub fn timestamp_stem() -> String {
    chrono::Local::now().format("%Y%m%d_%H_%M_%S").to_string()
}

/// Build `<dir>/<timestamp>.<suffix>`. An empty `dir` yields a bare filename.
pub fn profile_path(dir: &Path, suffix: &str) -> PathBuf {
    dir.join(format!("{}.{}", timestamp_stem(), suffix))
}

/// Owns the profile directory and the process-wide CPU sampling state.
pub struct Profiler {
    dir: PathBuf,
    cpu: CpuProfiler,
}

impl Profiler {
    pub fn new(config: &ProfilingConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.profile_dir),
            cpu: CpuProfiler::new(Duration::from_millis(config.cpu_sample_interval_ms.max(1))),
        }
    }

    /// Directory artifacts are written to (empty = current directory).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Begin CPU sampling into a fresh `.cpuprof` artifact.
    pub fn start_cpu(&self) -> Result<PathBuf, ProfileError> {
        let path = profile_path(&self.dir, "cpuprof");
        self.cpu.start(&path)?;
        tracing::info!(path = %path.display(), "CPU profiling started");
        Ok(path)
    }

    /// Stop CPU sampling. Returns the finished artifact, or `None` when idle.
    pub async fn stop_cpu(&self) -> Option<PathBuf> {
        let path = self.cpu.stop().await?;
        tracing::info!(path = %path.display(), "CPU profiling stopped");
        Some(path)
    }

    pub fn is_cpu_profiling(&self) -> bool {
        self.cpu.is_active()
    }

    /// Capture a point-in-time snapshot of `kind` into a new artifact.
    pub async fn snapshot(&self, kind: ProfileKind) -> Result<PathBuf, ProfileError> {
        let path = profile_path(&self.dir, kind.suffix());
        let body = serde_json::to_vec_pretty(&kind.capture())?;
        tokio::fs::write(&path, body).await?;

        tracing::info!(kind = kind.arg(), path = %path.display(), "Profile snapshot written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_path_shape() {
        let path = profile_path(Path::new("/tmp/prof"), "hprof");
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(path.starts_with("/tmp/prof"));
        assert!(name.ends_with(".hprof"));
        // YYYYMMDD_HH_MM_SS
        let stem = name.trim_end_matches(".hprof");
        assert_eq!(stem.len(), 17);
        assert_eq!(stem.matches('_').count(), 3);
    }

    #[test]
    fn test_empty_dir_means_cwd() {
        let path = profile_path(Path::new(""), "gprof");
        assert_eq!(path.components().count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_unwritable_dir_reports_io_message() {
        let profiler = Profiler::new(&ProfilingConfig {
            profile_dir: "/definitely/not/a/dir".into(),
            ..ProfilingConfig::default()
        });

        let err = profiler.snapshot(ProfileKind::Heap).await.unwrap_err();
        assert!(matches!(err, ProfileError::Io(_)));
        assert!(!err.to_string().is_empty());
    }
}
