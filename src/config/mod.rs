//! Configuration model for bistro.
//!
//! This module defines the Config struct that represents `bistro.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{BackendConfig, HistoryConfig};

/// File name of the config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "bistro.yaml";
