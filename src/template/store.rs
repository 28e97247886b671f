//! Template lookup by logical identifier.
//!
//! Template text for identifier `<id>` lives in `<templates_dir>/<id>_template.txt`.
//! The store reads the file on every render so edits take effect without a
//! restart; rendering itself is the pure [`render_template`] function.

use super::engine::{TemplateError, referenced_variables, render_template};
use crate::error::{BistroError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default social post template written by `bistro init`.
pub const DEFAULT_SOCIAL_POST_TEMPLATE: &str = "\
You are the social media manager of a restaurant.
Write a short, engaging Instagram caption for our dish \"{{ dish_name }}\".
Theme: {{ theme }}
Tone: {{ tone }}
Include a call to visit us and two or three relevant hashtags.
";

/// Default review reply template written by `bistro init`.
pub const DEFAULT_REVIEW_REPLY_TEMPLATE: &str = "\
You are the owner of a restaurant replying to a customer review.
Review: \"{{ review_text }}\"
The review sentiment is {{ sentiment }}.
Write a brief reply in a {{ tone }} tone. Thank the customer, address any
concerns they raised, and invite them back.
";

/// Resolves and renders templates from a directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Create a store reading from `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory the store reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a template identifier.
    pub fn template_path(&self, template_id: &str) -> PathBuf {
        self.dir.join(format!("{}_template.txt", template_id))
    }

    /// Load the raw template text.
    ///
    /// # Returns
    ///
    /// * `Err(BistroError::TemplateNotFound)` - Unknown identifier or missing file
    /// * `Err(BistroError::UserError)` - The file exists but cannot be read
    pub fn load(&self, template_id: &str) -> Result<String> {
        let path = self.template_path(template_id);

        if !is_valid_identifier(template_id) {
            return Err(BistroError::TemplateNotFound {
                id: template_id.to_string(),
                path: path.display().to_string(),
            });
        }

        tracing::debug!(template_id, path = %path.display(), "loading template");

        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BistroError::TemplateNotFound {
                id: template_id.to_string(),
                path: path.display().to_string(),
            },
            _ => BistroError::UserError(format!(
                "failed to read template '{}': {}",
                path.display(),
                e
            )),
        })
    }

    /// Render the named template with `variables`.
    pub fn render(&self, template_id: &str, variables: &BTreeMap<String, String>) -> Result<String> {
        let text = self.load(template_id)?;
        render_template(&text, variables)
            .map_err(|e| render_error(template_id, &text, variables, &e))
    }
}

/// Undefined variables are reported all at once, not just the first hit.
fn render_error(
    template_id: &str,
    text: &str,
    variables: &BTreeMap<String, String>,
    err: &TemplateError,
) -> BistroError {
    let reason = match err {
        TemplateError::UndefinedVariable { .. } => {
            let missing: Vec<String> = referenced_variables(text)
                .into_iter()
                .filter(|name| !variables.contains_key(name))
                .collect();
            if missing.len() > 1 {
                format!("{} (missing: {})", err, missing.join(", "))
            } else {
                err.to_string()
            }
        }
        _ => err.to_string(),
    };

    BistroError::RenderError {
        id: template_id.to_string(),
        reason,
    }
}

/// Identifiers are plain snake_case names; anything else could escape the directory.
fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
