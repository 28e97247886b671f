//! Atomic file replacement.
//!
//! The history log and the CSV export are always rewritten whole, so a reader
//! must never see a half-written file. Every write here follows the same
//! pattern:
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Rename it over the target
//!
//! `rename()` is atomic on POSIX when source and destination share a
//! filesystem, which holds because the temporary file lives next to the
//! target. On crash a temporary file named `.{filename}.{pid}.{n}.tmp` may
//! remain; it is never read back.

use crate::error::{BistroError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomically write bytes to a file.
///
/// Parent directories are created as needed.
///
/// # Example
///
/// ```no_run
/// use bistro::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("history.json"), b"[]")?;
/// # Ok::<(), bistro::error::BistroError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            BistroError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)?;

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Temporary path in the target's directory, unique per process and call so
/// concurrent writers of the same target never share a scratch file.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            BistroError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}.{}.tmp", filename, std::process::id(), n);
    Ok(parent.join(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        BistroError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        BistroError::UserError(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        BistroError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

#[cfg(unix)]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        BistroError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Persist the directory entry as well.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(not(unix))]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    // std::fs::rename maps to MoveFileExW with MOVEFILE_REPLACE_EXISTING.
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        BistroError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })
}
