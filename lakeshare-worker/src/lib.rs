//! Task worker process for lakeshare.
//!
//! The binary wires a `SharingContext` from configuration and runs the task
//! worker loop until interrupted.

pub mod config;

pub use config::{CONFIG_ENV, ConfigError, WorkerConfig};
