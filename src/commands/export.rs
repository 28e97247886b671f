//! Implementation of the `bistro export` command.

use bistro::context::AppContext;
use bistro::error::Result;
use bistro::history::{HistoryStore, TabularExport};

/// Execute the `bistro export` command.
///
/// Fails with `NoHistory` (exit code 5) if nothing was ever generated.
pub fn cmd_export(ctx: &AppContext) -> Result<()> {
    let export = HistoryStore::from_context(ctx).export_tabular()?;
    println!("{}", export_message(&export));
    Ok(())
}

fn export_message(export: &TabularExport) -> String {
    format!(
        "CSV exported successfully ({} rows): {}",
        export.rows,
        export.path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro::error::BistroError;
    use bistro::exit_codes;
    use bistro::history::EntryType;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_export_without_history_fails() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();

        let err = cmd_export(&ctx).unwrap_err();

        assert!(matches!(err, BistroError::NoHistory));
        assert_eq!(err.to_string(), "No history found");
        assert_eq!(err.exit_code(), exit_codes::HISTORY_FAILURE);
    }

    #[test]
    fn test_export_writes_configured_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("bistro.yaml"),
            "history:\n  export_file: exports/generations.csv\n",
        )
        .unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();
        let store = HistoryStore::from_context(&ctx);
        store
            .append(EntryType::SocialPost, BTreeMap::new(), "post")
            .unwrap();

        let export = store.export_tabular().unwrap();

        assert_eq!(export.path, temp_dir.path().join("exports/generations.csv"));
        assert!(export.path.is_file());
        assert_eq!(
            export_message(&export),
            format!(
                "CSV exported successfully (1 rows): {}",
                export.path.display()
            )
        );
    }
}
