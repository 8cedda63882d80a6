//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and TOML loading
//! - [`validation`]: Startup checks that report every problem at once

mod types;
pub mod validation;

pub use types::{ClusterConfig, Config, ConfigError, MetricsConfig, NodeConfig};
pub use validation::{ValidationError, validate};
