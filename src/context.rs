//! Data directory context resolution for bistro.
//!
//! Every command works against one data directory (the current working
//! directory unless `--data-dir` is given). This module loads `bistro.yaml`
//! from it and resolves the concrete paths of the history log, the export,
//! the lock file, the templates directory, and the uploads directory, so no
//! other module has to know how those paths are laid out.

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::error::{BistroError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Resolved paths and configuration for one data directory.
///
/// All paths are absolute when the data directory is.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Directory holding config, templates, history, and uploads.
    pub data_dir: PathBuf,

    /// Loaded (or default) configuration.
    pub config: Config,
}

impl AppContext {
    /// Resolve the context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            BistroError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the context from a specific data directory.
    ///
    /// The directory does not need to exist yet; `bistro init` creates it.
    pub fn resolve_from<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = absolutize(data_dir.as_ref())?;
        let config = Config::load(data_dir.join(CONFIG_FILE_NAME))?;

        Ok(Self::with_config(data_dir, config))
    }

    /// Build a context from an explicit config, skipping the config file.
    pub fn with_config<P: AsRef<Path>>(data_dir: P, config: Config) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            config,
        }
    }

    /// Path to `bistro.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    /// Path to the history log.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.history.file)
    }

    /// Path to the CSV export.
    pub fn export_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.history.export_file)
    }

    /// Path to the history lock file (`<log>.lock` next to the log).
    pub fn history_lock_path(&self) -> PathBuf {
        lock_path_for(&self.history_path())
    }

    /// Directory holding the prompt templates.
    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir.join(&self.config.templates_dir)
    }

    /// Directory receiving uploaded images.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(&self.config.uploads_dir)
    }

    /// Express `path` relative to the data directory when it lives inside it.
    pub fn relative_to_data_dir(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.data_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Lock file path for a given log file.
pub fn lock_path_for(log_path: &Path) -> PathBuf {
    let mut name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    log_path.with_file_name(name)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| {
        BistroError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    Ok(cwd.join(path))
}
