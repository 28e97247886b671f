//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::context::lock_path_for;
use crate::error::{BistroError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read, parsed, or validated is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            BistroError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct; treat it as defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| BistroError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| BistroError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `model_id` must be non-empty
    /// - `backend.base_url` must be an absolute http(s) URL
    /// - timeouts and the stale-lock threshold must be positive
    /// - history and export file names must be non-empty and distinct
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(invalid("model_id must not be empty"));
        }

        let url = reqwest::Url::parse(&self.backend.base_url).map_err(|e| {
            invalid(&format!(
                "backend.base_url '{}' is not a valid URL: {}",
                self.backend.base_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(&format!(
                "backend.base_url must use http or https (found '{}')",
                url.scheme()
            )));
        }

        if self.backend.timeout_seconds == 0 {
            return Err(invalid("backend.timeout_seconds must be greater than 0"));
        }
        if self.backend.connect_timeout_seconds == 0 {
            return Err(invalid(
                "backend.connect_timeout_seconds must be greater than 0",
            ));
        }
        if self.history.lock_timeout_ms == 0 {
            return Err(invalid("history.lock_timeout_ms must be greater than 0"));
        }
        if self.history.lock_stale_minutes == 0 {
            return Err(invalid("history.lock_stale_minutes must be greater than 0"));
        }

        if self.history.file.trim().is_empty() {
            return Err(invalid("history.file must not be empty"));
        }
        if self.history.export_file.trim().is_empty() {
            return Err(invalid("history.export_file must not be empty"));
        }
        let log_path = Path::new(&self.history.file);
        let export_path = Path::new(&self.history.export_file);
        if log_path == export_path {
            return Err(invalid(
                "history.file and history.export_file must be different files",
            ));
        }
        if export_path == lock_path_for(log_path) {
            return Err(invalid(
                "history.export_file must not be the history lock file",
            ));
        }

        Ok(())
    }

    /// Request timeout for the model backend.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds)
    }

    /// Connect timeout for the model backend.
    pub fn backend_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.connect_timeout_seconds)
    }

    /// Maximum wait for the history lock.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.history.lock_timeout_ms)
    }
}

fn invalid(message: &str) -> BistroError {
    BistroError::UserError(format!("config validation failed: {}", message))
}
