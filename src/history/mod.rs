//! Generation history subsystem.
//!
//! This module implements the durable, append-only log of past generations.
//! The log lives in a single JSON file (default `history.json`) that only
//! [`HistoryStore`] reads or writes.
//!
//! # Log Format
//!
//! The log is a JSON array; each element has:
//! - `type`: `social_post` or `review_reply`
//! - `input`: the request fields the prompt was built from
//! - `output`: the generated text
//! - `timestamp`: RFC 3339 append time assigned by the store
//!
//! # Operations
//!
//! - `append` - add an entry (serialized across threads and processes)
//! - `read_all` / `read_filtered` - read the log, optionally by type
//! - `export_tabular` - write the log as CSV

mod entry;
mod export;
mod store;


pub use entry::{EntryType, HistoryEntry};
pub use export::{EXPORT_HEADER, TabularExport, parse_input_field, to_csv};
pub use store::HistoryStore;
