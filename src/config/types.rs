//! Configuration sections and defaults for bistro.
//!
//! This module defines the nested sections of `bistro.yaml` and the default
//! value functions used by serde.

use serde::{Deserialize, Serialize};

/// Default model identifier passed to the backend.
pub const DEFAULT_MODEL_ID: &str = "phi";

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in seconds (generation included).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

/// History log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Log file name, relative to the data directory.
    #[serde(default = "default_history_file")]
    pub file: String,

    /// CSV export file name, relative to the data directory.
    #[serde(default = "default_export_file")]
    pub export_file: String,

    /// How long an append waits for the history lock, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Minutes after which a lock file is treated as abandoned.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: default_history_file(),
            export_file: default_export_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
            lock_stale_minutes: default_lock_stale_minutes(),
        }
    }
}

pub(crate) fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_seconds() -> u64 {
    120
}
fn default_connect_timeout_seconds() -> u64 {
    5
}
fn default_history_file() -> String {
    "history.json".to_string()
}
fn default_export_file() -> String {
    "history.csv".to_string()
}
fn default_lock_timeout_ms() -> u64 {
    10_000
}
fn default_lock_stale_minutes() -> u32 {
    10
}
pub(crate) fn default_templates_dir() -> String {
    "prompts".to_string()
}
pub(crate) fn default_uploads_dir() -> String {
    "static/uploads".to_string()
}
