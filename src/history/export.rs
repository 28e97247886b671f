//! CSV projection of the history log.
//!
//! One row per entry in log order, under the header
//! `Type,Timestamp,Input,Output`. The `Input` column holds the input mapping
//! as compact JSON with sorted keys and non-ASCII text left as-is, so the
//! same log always yields the same bytes and every cell parses back to the
//! original mapping.

use super::entry::HistoryEntry;
use crate::error::{BistroError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Column headers of the export.
pub const EXPORT_HEADER: [&str; 4] = ["Type", "Timestamp", "Input", "Output"];

/// Result of an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularExport {
    /// Where the CSV was written.
    pub path: PathBuf,
    /// Number of data rows (header excluded).
    pub rows: usize,
    /// The CSV text exactly as written.
    pub content: String,
}

/// Render entries as CSV text.
pub fn to_csv(entries: &[HistoryEntry]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER).map_err(export_error)?;

    for entry in entries {
        let input = serde_json::to_string(&entry.input).map_err(|e| {
            BistroError::HistoryWriteError(format!("failed to serialize entry input: {}", e))
        })?;
        writer
            .write_record([
                entry.entry_type.as_str(),
                entry.timestamp_string().as_str(),
                input.as_str(),
                entry.output.as_str(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BistroError::HistoryWriteError(format!("failed to finish CSV export: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| BistroError::HistoryWriteError(format!("CSV export is not UTF-8: {}", e)))
}

/// Parse an `Input` cell back into the mapping it was produced from.
pub fn parse_input_field(cell: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(cell)
        .map_err(|e| BistroError::HistoryReadError(format!("invalid Input cell '{}': {}", cell, e)))
}

fn export_error(e: csv::Error) -> BistroError {
    BistroError::HistoryWriteError(format!("failed to write CSV export: {}", e))
}
