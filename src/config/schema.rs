//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Operator console settings.
    pub console: ConsoleConfig,

    /// Where and how profiles are captured.
    pub profiling: ProfilingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Operator console configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Bind address for the line transport (e.g., "127.0.0.1:3333").
    ///
    /// `None` keeps the console off the network; commands remain reachable
    /// through `Console::dispatch`.
    pub bind_address: Option<String>,

    /// Maximum concurrent operator sessions.
    pub max_connections: usize,

    /// Prompt written before each input line.
    pub prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            max_connections: 16,
            prompt: "> ".to_string(),
        }
    }
}

/// Profiling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Directory profile artifacts are written to. Empty means the current
    /// working directory.
    pub profile_dir: String,

    /// CPU sampling interval in milliseconds.
    pub cpu_sample_interval_ms: u64,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            profile_dir: String::new(),
            cpu_sample_interval_ms: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert!(config.console.bind_address.is_none());
        assert_eq!(config.console.max_connections, 16);
        assert_eq!(config.profiling.profile_dir, "");
        assert_eq!(config.profiling.cpu_sample_interval_ms, 10);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [profiling]
            profile_dir = "/var/tmp/prof"
            "#,
        )
        .unwrap();
        assert_eq!(config.profiling.profile_dir, "/var/tmp/prof");
        assert_eq!(config.profiling.cpu_sample_interval_ms, 10);
        assert_eq!(config.console.prompt, "> ");
    }
}
