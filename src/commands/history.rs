//! Implementation of the `bistro history` command.

use crate::cli::HistoryArgs;
use bistro::context::AppContext;
use bistro::error::{BistroError, Result};
use bistro::history::HistoryStore;

/// Execute the `bistro history` command.
///
/// Prints the log (optionally filtered by type) as a pretty JSON array. An
/// empty or absent log prints `[]`.
pub fn cmd_history(ctx: &AppContext, args: HistoryArgs) -> Result<()> {
    println!("{}", history_json(ctx, args.entry_type.as_deref())?);
    Ok(())
}

fn history_json(ctx: &AppContext, entry_type: Option<&str>) -> Result<String> {
    let entries = HistoryStore::from_context(ctx).read_filtered(entry_type)?;
    serde_json::to_string_pretty(&entries)
        .map_err(|e| BistroError::UserError(format!("failed to format history: {}", e)))
}
