//! Command implementations for bistro.
//!
//! This module resolves the data directory context once and routes each CLI
//! command to its handler. Handlers print results to stdout; diagnostics go
//! through `tracing` to stderr.

mod export;
mod generate;
mod history;
mod init;
mod lock;

use crate::cli::{Cli, Command, LockAction, LockCommand};
use bistro::context::AppContext;
use bistro::error::{BistroError, Result};
use std::path::Path;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = resolve_context(cli.data_dir.as_deref(), cli.model)?;

    match cli.command {
        Command::Init => init::cmd_init(&ctx),
        Command::Post(args) => generate::cmd_post(&ctx, args),
        Command::Reply(args) => generate::cmd_reply(&ctx, args),
        Command::History(args) => history::cmd_history(&ctx, args),
        Command::Export => export::cmd_export(&ctx),
        Command::Lock(lock_cmd) => dispatch_lock(&ctx, lock_cmd),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(ctx: &AppContext, lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::Status => lock::cmd_lock_status(ctx),
        LockAction::Clear(args) => lock::cmd_lock_clear(ctx, args),
    }
}

/// Load the data directory context and apply command-line overrides.
fn resolve_context(data_dir: Option<&Path>, model: Option<String>) -> Result<AppContext> {
    let mut ctx = match data_dir {
        Some(dir) => AppContext::resolve_from(dir)?,
        None => AppContext::resolve()?,
    };

    if let Some(model) = model {
        let model = model.trim();
        if model.is_empty() {
            return Err(BistroError::UserError("--model must not be empty".to_string()));
        }
        ctx.config.model_id = model.to_string();
    }

    tracing::debug!(
        data_dir = %ctx.data_dir.display(),
        model = %ctx.config.model_id,
        "resolved context"
    );

    Ok(ctx)
}
