//! Error types for bistro.
//!
//! Uses thiserror for derive macros. Each variant maps to one exit code so
//! callers (and scripts driving the CLI) can tell error classes apart.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for bistro operations.
#[derive(Error, Debug)]
pub enum BistroError {
    /// User provided invalid arguments, config, or the filesystem is unusable.
    #[error("{0}")]
    UserError(String),

    /// The generation request is missing required fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No template exists for the logical identifier.
    #[error("template '{id}' not found (looked for '{path}')")]
    TemplateNotFound { id: String, path: String },

    /// The template exists but substitution could not complete.
    #[error("failed to render template '{id}': {reason}")]
    RenderError { id: String, reason: String },

    /// The model backend could not be reached.
    #[error("model backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The model backend did not answer in time.
    #[error("model backend timed out: {0}")]
    BackendTimeout(String),

    /// The model backend answered with a failure or an unusable body.
    #[error("model backend error: {0}")]
    BackendError(String),

    /// Appending to the history log failed.
    #[error("failed to write history: {0}")]
    HistoryWriteError(String),

    /// The history log exists but could not be read or parsed.
    #[error("failed to read history: {0}")]
    HistoryReadError(String),

    /// Export was requested before anything was ever appended.
    #[error("No history found")]
    NoHistory,

    /// The history lock could not be acquired.
    #[error("Lock acquisition failed: {0}")]
    LockError(String),
}

impl BistroError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BistroError::UserError(_) => exit_codes::USER_ERROR,
            BistroError::InvalidRequest(_) => exit_codes::INVALID_REQUEST,
            BistroError::TemplateNotFound { .. } | BistroError::RenderError { .. } => {
                exit_codes::TEMPLATE_FAILURE
            }
            BistroError::BackendUnavailable(_)
            | BistroError::BackendTimeout(_)
            | BistroError::BackendError(_) => exit_codes::BACKEND_FAILURE,
            BistroError::HistoryWriteError(_)
            | BistroError::HistoryReadError(_)
            | BistroError::NoHistory => exit_codes::HISTORY_FAILURE,
            BistroError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }

    /// Whether the failure came from the model backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            BistroError::BackendUnavailable(_)
                | BistroError::BackendTimeout(_)
                | BistroError::BackendError(_)
        )
    }
}

/// Result type alias for bistro operations.
pub type Result<T> = std::result::Result<T, BistroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_has_correct_exit_code() {
        let err = BistroError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn test_template_errors_share_exit_code() {
        let not_found = BistroError::TemplateNotFound {
            id: "social_post".to_string(),
            path: "prompts/social_post_template.txt".to_string(),
        };
        let render = BistroError::RenderError {
            id: "social_post".to_string(),
            reason: "undefined variable".to_string(),
        };
        assert_eq!(not_found.exit_code(), exit_codes::TEMPLATE_FAILURE);
        assert_eq!(render.exit_code(), exit_codes::TEMPLATE_FAILURE);
    }

    #[test]
    fn test_backend_errors_have_correct_exit_code() {
        for err in [
            BistroError::BackendUnavailable("refused".to_string()),
            BistroError::BackendTimeout("120s".to_string()),
            BistroError::BackendError("HTTP 500".to_string()),
        ] {
            assert!(err.is_backend());
            assert_eq!(err.exit_code(), exit_codes::BACKEND_FAILURE);
        }
    }

    #[test]
    fn test_history_errors_have_correct_exit_code() {
        assert_eq!(BistroError::NoHistory.exit_code(), exit_codes::HISTORY_FAILURE);
        assert_eq!(
            BistroError::HistoryWriteError("disk full".to_string()).exit_code(),
            exit_codes::HISTORY_FAILURE
        );
        assert!(!BistroError::NoHistory.is_backend());
    }

    #[test]
    fn test_lock_error_has_correct_exit_code() {
        let err = BistroError::LockError("history locked".to_string());
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        assert_eq!(BistroError::NoHistory.to_string(), "No history found");

        let err = BistroError::InvalidRequest("missing field 'tone'".to_string());
        assert_eq!(err.to_string(), "invalid request: missing field 'tone'");
    }
}
