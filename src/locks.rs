//! Persisted history lock.
//!
//! The history log is rewritten whole on every append, so two writers racing
//! through read-modify-write would silently lose one update. Appends inside
//! one process are serialized by the store's mutex; this module serializes
//! them across processes with a lock file next to the log
//! (`history.json.lock`).
//!
//! # Lock Files
//!
//! Lock files are created with **create_new** semantics (exclusive create),
//! so only one holder can exist at a time. Acquisition polls until the lock
//! is free or the configured timeout passes.
//!
//! # Lock Metadata
//!
//! Each lock file contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `pid`: The process ID (optional)
//! - `created_at`: RFC3339 timestamp
//! - `action`: The action being performed (append)
//!
//! # Stale Locks
//!
//! A lock older than the stale threshold is treated as left behind by a
//! crashed process: it is removed with a warning and acquisition retried.
//!
//! # RAII Guards
//!
//! The lock is released when its guard is dropped. If deletion fails during
//! drop, a warning is logged but the program does not crash.

use crate::error::{BistroError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// Interval between acquisition attempts while the lock is held elsewhere.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(5);

/// Lock metadata stored in lock files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was created (RFC3339).
    pub created_at: DateTime<Utc>,

    /// The action being performed.
    pub action: String,
}

impl LockMetadata {
    /// Create new lock metadata with the current timestamp.
    pub fn new(action: &str) -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Parse lock metadata from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            BistroError::LockError(format!(
                "failed to read lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            BistroError::LockError(format!(
                "failed to parse lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Serialize lock metadata to JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BistroError::LockError(format!("failed to serialize lock metadata: {}", e)))
    }

    /// Calculate the age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        format_age(self.age())
    }

    /// Check if the lock is stale based on the given threshold in minutes.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age().num_minutes() >= stale_minutes as i64
    }
}

fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds();
    let minutes = age.num_minutes();
    let hours = age.num_hours();
    let days = age.num_days();

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds.max(0))
    }
}

/// Get the owner string for lock metadata.
fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Information about an existing lock file.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// Parsed metadata, if the file could be read.
    pub metadata: Option<LockMetadata>,

    /// Whether the lock is stale.
    pub is_stale: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.metadata {
            Some(meta) => write!(
                f,
                "{} (owner: {}, age: {}, action: {}{})",
                self.path.display(),
                meta.owner,
                meta.age_string(),
                meta.action,
                if self.is_stale { ", STALE" } else { "" }
            ),
            None => write!(
                f,
                "{} (unreadable metadata{})",
                self.path.display(),
                if self.is_stale { ", STALE" } else { "" }
            ),
        }
    }
}

/// RAII guard for a lock file.
///
/// When dropped, the lock file is automatically deleted.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manually release the lock, surfacing any deletion error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| {
            BistroError::LockError(format!(
                "failed to release lock '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release lock"
            );
        }
    }
}

/// Outcome of a single acquisition attempt.
enum Attempt {
    Acquired(LockGuard),
    Held,
}

/// Try once to create the lock file exclusively.
fn try_acquire(lock_path: &Path, metadata: &LockMetadata) -> Result<Attempt> {
    if let Some(parent) = lock_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            BistroError::LockError(format!(
                "failed to create lock directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(Attempt::Held),
        Err(e) => {
            return Err(BistroError::LockError(format!(
                "failed to acquire lock '{}': {}",
                lock_path.display(),
                e
            )));
        }
    };

    let json = metadata.to_json()?;
    file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(lock_path);
        BistroError::LockError(format!("failed to write lock metadata: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(lock_path);
        BistroError::LockError(format!("failed to sync lock file: {}", e))
    })?;

    Ok(Attempt::Acquired(LockGuard::new(lock_path.to_path_buf())))
}

/// Acquire a lock file, waiting for other holders to release it.
///
/// # Arguments
///
/// * `lock_path` - Path to the lock file
/// * `action` - The action being performed (for lock metadata)
/// * `timeout` - Maximum time to wait for the lock
/// * `stale_minutes` - Age after which an existing lock is considered abandoned
///
/// # Returns
///
/// * `Ok(LockGuard)` - Lock acquired
/// * `Err(BistroError::LockError)` - Timed out, or the lock file could not be created
pub fn acquire_lock(
    lock_path: &Path,
    action: &str,
    timeout: std::time::Duration,
    stale_minutes: u32,
) -> Result<LockGuard> {
    let start = Instant::now();

    loop {
        let metadata = LockMetadata::new(action);
        if let Attempt::Acquired(guard) = try_acquire(lock_path, &metadata)? {
            tracing::debug!(path = %lock_path.display(), action, "acquired lock");
            return Ok(guard);
        }

        if let Some(info) = inspect_lock(lock_path, stale_minutes)
            && info.is_stale
        {
            tracing::warn!(lock = %info, "removing stale lock");
            remove_if_unchanged(lock_path, info.metadata.as_ref());
            continue;
        }

        if start.elapsed() >= timeout {
            let holder = inspect_lock(lock_path, stale_minutes)
                .map(|info| format!("\nLock: {}", info))
                .unwrap_or_default();
            return Err(BistroError::LockError(format!(
                "lock is held by another process (waited {} ms){}",
                timeout.as_millis(),
                holder
            )));
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Remove a stale lock only if it still carries the metadata we judged stale.
///
/// This narrows, but cannot close, the window in which two waiters both
/// decide the same lock is stale.
fn remove_if_unchanged(lock_path: &Path, seen: Option<&LockMetadata>) {
    let current = LockMetadata::from_file(lock_path).ok();
    if current.as_ref() != seen {
        return;
    }
    if let Err(e) = fs::remove_file(lock_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %lock_path.display(), error = %e, "failed to remove stale lock");
    }
}

/// Inspect an existing lock file.
///
/// Returns `None` if no lock file exists. A lock file whose metadata cannot
/// be read (for example, a holder crashed between create and write) is aged
/// by its modification time instead.
pub fn inspect_lock(lock_path: &Path, stale_minutes: u32) -> Option<LockInfo> {
    let file_meta = fs::metadata(lock_path).ok()?;

    let metadata = LockMetadata::from_file(lock_path).ok();
    let is_stale = match &metadata {
        Some(meta) => meta.is_stale(stale_minutes),
        None => file_meta
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map(|age| age.as_secs() >= stale_minutes as u64 * 60)
            .unwrap_or(false),
    };

    Some(LockInfo {
        path: lock_path.to_path_buf(),
        metadata,
        is_stale,
    })
}

/// Forcibly remove a lock file.
///
/// Returns `Ok(false)` if there was no lock to clear.
pub fn clear_lock(lock_path: &Path) -> Result<bool> {
    match fs::remove_file(lock_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BistroError::LockError(format!(
            "failed to clear lock '{}': {}",
            lock_path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    const LONG: StdDuration = StdDuration::from_secs(30);

    fn write_lock(path: &Path, created_at: DateTime<Utc>) {
        let meta = LockMetadata {
            owner: "cook@kitchen".to_string(),
            pid: Some(1),
            created_at,
            action: "append".to_string(),
        };
        fs::write(path, meta.to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_acquire_creates_lock_with_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");

        let guard = acquire_lock(&lock_path, "append", LONG, 10).unwrap();

        assert!(lock_path.exists());
        assert_eq!(guard.path(), lock_path);
        let meta = LockMetadata::from_file(&lock_path).unwrap();
        assert_eq!(meta.action, "append");
        assert_eq!(meta.pid, Some(std::process::id()));
        assert!(meta.owner.contains('@'));
    }

    #[test]
    fn test_guard_drop_releases_lock() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");

        {
            let _guard = acquire_lock(&lock_path, "append", LONG, 10).unwrap();
            assert!(lock_path.exists());
        }

        assert!(!lock_path.exists());
    }

    #[test]
    fn test_manual_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");

        let guard = acquire_lock(&lock_path, "append", LONG, 10).unwrap();
        guard.release().unwrap();

        assert!(!lock_path.exists());
    }

    #[test]
    fn test_held_lock_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        let _held = acquire_lock(&lock_path, "append", LONG, 10).unwrap();

        let result = acquire_lock(&lock_path, "append", StdDuration::from_millis(50), 10);

        let err = result.unwrap_err();
        assert!(matches!(err, BistroError::LockError(_)));
        assert!(err.to_string().contains("held by another process"));
    }

    #[test]
    fn test_waiter_acquires_after_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        let held = acquire_lock(&lock_path, "append", LONG, 10).unwrap();

        let waiter_path = lock_path.clone();
        let waiter = std::thread::spawn(move || {
            acquire_lock(&waiter_path, "append", LONG, 10).map(|g| g.release())
        });

        std::thread::sleep(StdDuration::from_millis(50));
        held.release().unwrap();

        waiter.join().unwrap().unwrap().unwrap();
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        write_lock(&lock_path, Utc::now() - Duration::minutes(30));

        let guard = acquire_lock(&lock_path, "append", StdDuration::from_millis(200), 10).unwrap();

        let meta = LockMetadata::from_file(guard.path()).unwrap();
        assert_eq!(meta.pid, Some(std::process::id()));
    }

    #[test]
    fn test_fresh_foreign_lock_is_respected() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        write_lock(&lock_path, Utc::now());

        let result = acquire_lock(&lock_path, "append", StdDuration::from_millis(50), 10);

        assert!(result.is_err());
        assert_eq!(LockMetadata::from_file(&lock_path).unwrap().pid, Some(1));
    }

    #[test]
    fn test_lock_serializes_threads() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = Arc::new(temp_dir.path().join("history.json.lock"));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock_path = Arc::clone(&lock_path);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        let _guard = acquire_lock(&lock_path, "append", LONG, 10).unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(StdDuration::from_millis(1));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inspect_missing_lock() {
        let temp_dir = TempDir::new().unwrap();
        assert!(inspect_lock(&temp_dir.path().join("none.lock"), 10).is_none());
    }

    #[test]
    fn test_inspect_reports_staleness() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");

        write_lock(&lock_path, Utc::now() - Duration::minutes(11));
        let info = inspect_lock(&lock_path, 10).unwrap();
        assert!(info.is_stale);
        assert!(info.to_string().contains("STALE"));

        write_lock(&lock_path, Utc::now());
        let info = inspect_lock(&lock_path, 10).unwrap();
        assert!(!info.is_stale);
        assert!(info.to_string().contains("cook@kitchen"));
    }

    #[test]
    fn test_inspect_unreadable_metadata_is_not_stale_when_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        fs::write(&lock_path, "").unwrap();

        let info = inspect_lock(&lock_path, 10).unwrap();
        assert!(info.metadata.is_none());
        assert!(!info.is_stale);
    }

    #[test]
    fn test_clear_lock() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("history.json.lock");
        write_lock(&lock_path, Utc::now());

        assert!(clear_lock(&lock_path).unwrap());
        assert!(!lock_path.exists());
        assert!(!clear_lock(&lock_path).unwrap());
    }

    #[test]
    fn test_age_string_formats() {
        assert_eq!(format_age(Duration::seconds(12)), "12s");
        assert_eq!(format_age(Duration::minutes(5)), "5m");
        assert_eq!(format_age(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_age(Duration::hours(50)), "2d 2h");
    }
}
