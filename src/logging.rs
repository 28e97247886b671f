//! Diagnostic logging.
//!
//! Events go to stderr so stdout carries only command output. The filter
//! comes from `BISTRO_LOG`, then `RUST_LOG`, then a level picked by the
//! number of `-v` flags.

use crate::error::{BistroError, Result};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV_VAR: &str = "BISTRO_LOG";

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Default directive for a given verbosity.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init(verbosity: u8) -> Result<()> {
    if TRACING_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| BistroError::UserError(format!("failed to install logger: {}", e)))?;
    let _ = TRACING_INITIALIZED.set(());
    Ok(())
}

/// Pick the first usable filter; invalid directives fall through.
fn resolve_filter(verbosity: u8) -> EnvFilter {
    [LOG_ENV_VAR, "RUST_LOG"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .filter(|value| !value.trim().is_empty())
        .find_map(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)))
}
