//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for bistro.
///
/// This struct represents the contents of `bistro.yaml` in the data
/// directory. Unknown fields in the YAML are ignored for forward
/// compatibility, and every field has a default so an empty or missing file
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model identifier sent with every generation request.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Model backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// History log location and locking behavior.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Directory holding `<id>_template.txt` files, relative to the data directory.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Directory receiving uploaded images, relative to the data directory.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            backend: BackendConfig::default(),
            history: HistoryConfig::default(),
            templates_dir: default_templates_dir(),
            uploads_dir: default_uploads_dir(),
        }
    }
}
