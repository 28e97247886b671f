//! Image uploads attached to social posts.
//!
//! An image is copied into the uploads directory under a sanitized name and
//! only its path is ever recorded. The contents are never inspected.

use crate::error::{BistroError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static UNSAFE_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Invalid filename regex"));

/// Reduce an uploaded file name to a safe, flat ASCII name.
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9._-]` is removed, and leading or
/// trailing dots and underscores are stripped. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = WHITESPACE_REGEX.replace_all(ascii.trim(), "_");
    let cleaned = UNSAFE_CHARS_REGEX.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Copy `source` into `uploads_dir` and return the stored path.
///
/// A file already stored under the same name is overwritten.
///
/// # Returns
///
/// * `Err(BistroError::InvalidRequest)` - `source` is not a readable file or its name sanitizes to nothing
/// * `Err(BistroError::UserError)` - The uploads directory could not be written
pub fn store_image(uploads_dir: &Path, source: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(BistroError::InvalidRequest(format!(
            "image '{}' does not exist or is not a file",
            source.display()
        )));
    }

    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = sanitize_filename(&original_name);
    if file_name.is_empty() {
        return Err(BistroError::InvalidRequest(format!(
            "image name '{}' has no usable characters",
            original_name
        )));
    }

    fs::create_dir_all(uploads_dir).map_err(|e| {
        BistroError::UserError(format!(
            "failed to create uploads directory '{}': {}",
            uploads_dir.display(),
            e
        ))
    })?;

    let destination = uploads_dir.join(&file_name);
    if is_same_file(source, &destination) {
        tracing::debug!(
            stored = %destination.display(),
            "image already stored under its upload name"
        );
        return Ok(destination);
    }

    fs::copy(source, &destination).map_err(|e| {
        BistroError::UserError(format!(
            "failed to copy '{}' to '{}': {}",
            source.display(),
            destination.display(),
            e
        ))
    })?;

    tracing::info!(
        source = %source.display(),
        stored = %destination.display(),
        "stored uploaded image"
    );

    Ok(destination)
}

/// Copying a file onto itself truncates it, so that case must be caught first.
fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
