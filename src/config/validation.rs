//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval > 0, connection limit > 0)
//! - Check the console bind address parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.profiling.cpu_sample_interval_ms == 0 {
        errors.push(ValidationError {
            field: "profiling.cpu_sample_interval_ms",
            message: "must be greater than 0".to_string(),
        });
    }

    if config.console.max_connections == 0 {
        errors.push(ValidationError {
            field: "console.max_connections",
            message: "must be greater than 0".to_string(),
        });
    }

    if let Some(addr) = &config.console.bind_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: "console.bind_address",
                message: format!("'{}' is not a socket address", addr),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
