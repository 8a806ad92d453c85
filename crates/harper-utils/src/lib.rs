//! Shared utilities for harperbot
//!
//! This crate provides common functionality used across the harperbot workspace,
//! including logging setup and the service configuration.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{LogFormat, init_tracing_with};
