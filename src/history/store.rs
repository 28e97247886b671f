//! The append-only history store.
//!
//! The log is a pretty-printed JSON array rewritten whole on every append.
//! Appends run read-modify-write under two locks held for the whole cycle:
//! the store's mutex (threads of this process) and the persisted lock file
//! (other processes). Every write is an atomic rename, so readers take no
//! lock and always see either the old or the new log, never a torn one.

use super::entry::{EntryType, HistoryEntry};
use super::export::{TabularExport, to_csv};
use crate::context::{AppContext, lock_path_for};
use crate::error::{BistroError, Result};
use crate::fs::{atomic_write, atomic_write_file};
use crate::locks;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOCK_STALE_MINUTES: u32 = 10;

/// Single owner of the history log file.
#[derive(Debug)]
pub struct HistoryStore {
    log_path: PathBuf,
    export_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    lock_stale_minutes: u32,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store for `log_path`, exporting to `export_path`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(log_path: P, export_path: Q) -> Self {
        let log_path = log_path.as_ref().to_path_buf();
        Self {
            lock_path: lock_path_for(&log_path),
            log_path,
            export_path: export_path.as_ref().to_path_buf(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_stale_minutes: DEFAULT_LOCK_STALE_MINUTES,
            write_lock: Mutex::new(()),
        }
    }

    /// Create the store configured for a data directory.
    pub fn from_context(ctx: &AppContext) -> Self {
        Self::new(ctx.history_path(), ctx.export_path())
            .with_lock_timeout(ctx.config.lock_timeout())
            .with_lock_stale_minutes(ctx.config.history.lock_stale_minutes)
    }

    /// Set how long an append waits for the persisted lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the age after which a lock file is treated as abandoned.
    pub fn with_lock_stale_minutes(mut self, minutes: u32) -> Self {
        self.lock_stale_minutes = minutes;
        self
    }

    /// Path of the log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Path of the CSV export.
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Path of the persisted lock file.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Whether anything has ever been appended (the log file exists).
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Append a generation to the log and return the stored entry.
    ///
    /// The timestamp is assigned here and is never earlier than the
    /// timestamp of the current last entry.
    ///
    /// # Returns
    ///
    /// * `Err(BistroError::LockError)` - The persisted lock could not be acquired
    /// * `Err(BistroError::HistoryReadError)` - The existing log is unreadable; it is left untouched
    /// * `Err(BistroError::HistoryWriteError)` - The new log could not be written
    pub fn append(
        &self,
        entry_type: EntryType,
        input: BTreeMap<String, String>,
        output: impl Into<String>,
    ) -> Result<HistoryEntry> {
        // A panic in another appender cannot leave the file half-written, so
        // a poisoned mutex is still safe to use.
        let _thread_guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let _file_guard = locks::acquire_lock(
            &self.lock_path,
            "append",
            self.lock_timeout,
            self.lock_stale_minutes,
        )?;

        let mut entries = self.load()?.unwrap_or_default();

        let now = Utc::now();
        let timestamp = match entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let entry = HistoryEntry {
            entry_type,
            input,
            output: output.into(),
            timestamp,
        };
        entries.push(entry.clone());

        let json = serde_json::to_vec_pretty(&entries).map_err(|e| {
            BistroError::HistoryWriteError(format!("failed to serialize history: {}", e))
        })?;
        atomic_write(&self.log_path, &json).map_err(|e| {
            BistroError::HistoryWriteError(format!("'{}': {}", self.log_path.display(), e))
        })?;

        tracing::info!(
            entry_type = %entry.entry_type,
            entries = entries.len(),
            path = %self.log_path.display(),
            "appended history entry"
        );

        Ok(entry)
    }

    /// The full log in append order; empty if nothing was ever appended.
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Entries of one type, in append order.
    pub fn read_of_type(&self, entry_type: EntryType) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.entry_type == entry_type)
            .collect())
    }

    /// Entries whose type matches `entry_type`.
    ///
    /// An absent or unrecognized type name returns the unfiltered log.
    pub fn read_filtered(&self, entry_type: Option<&str>) -> Result<Vec<HistoryEntry>> {
        match entry_type.and_then(EntryType::from_str) {
            Some(t) => self.read_of_type(t),
            None => {
                if let Some(name) = entry_type {
                    tracing::debug!(entry_type = name, "unknown entry type, returning full log");
                }
                self.read_all()
            }
        }
    }

    /// Write the log as CSV to the export path, replacing any earlier export.
    ///
    /// # Returns
    ///
    /// * `Err(BistroError::NoHistory)` - Nothing was ever appended
    pub fn export_tabular(&self) -> Result<TabularExport> {
        let entries = self.load()?.ok_or(BistroError::NoHistory)?;
        let content = to_csv(&entries)?;

        atomic_write_file(&self.export_path, &content).map_err(|e| {
            BistroError::HistoryWriteError(format!("'{}': {}", self.export_path.display(), e))
        })?;

        tracing::info!(
            rows = entries.len(),
            path = %self.export_path.display(),
            "exported history"
        );

        Ok(TabularExport {
            path: self.export_path.clone(),
            rows: entries.len(),
            content,
        })
    }

    /// Read the log. `None` means the log does not exist.
    fn load(&self) -> Result<Option<Vec<HistoryEntry>>> {
        let content = match fs::read_to_string(&self.log_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BistroError::HistoryReadError(format!(
                    "'{}': {}",
                    self.log_path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }

        serde_json::from_str(&content).map(Some).map_err(|e| {
            BistroError::HistoryReadError(format!(
                "'{}' is not a valid history log: {}",
                self.log_path.display(),
                e
            ))
        })
    }
}
