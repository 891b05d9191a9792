//! Operator console and lifecycle coordinator for long-running services.

#![cfg_attr(not(feature = "alloc-tracking"), forbid(unsafe_code))]

pub mod config;
pub mod console;
pub mod gateway;
pub mod lifecycle;
pub mod module;
pub mod net;
pub mod observability;
pub mod profiling;

pub use config::schema::ServiceConfig;
pub use console::{Console, ConsoleBuilder};
pub use lifecycle::{Coordinator, Shutdown};
pub use module::{Module, ModuleSetup};
