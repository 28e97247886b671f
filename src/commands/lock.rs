//! Implementation of the `bistro lock` commands.
//!
//! The history lock normally lives only for the duration of one append. A
//! lock file that outlives its holder (e.g. after a crash) is taken over
//! automatically once it is stale; these commands let an operator inspect
//! or remove it sooner.

use crate::cli::LockClearArgs;
use bistro::context::AppContext;
use bistro::error::{BistroError, Result};
use bistro::locks::{self, LockInfo};

/// Execute the `bistro lock status` command.
pub fn cmd_lock_status(ctx: &AppContext) -> Result<()> {
    let stale_minutes = ctx.config.history.lock_stale_minutes;

    match locks::inspect_lock(&ctx.history_lock_path(), stale_minutes) {
        None => println!("No history lock held."),
        Some(info) => {
            println!("History lock held:");
            print_lock_details(&info);
            if info.is_stale {
                println!(
                    "  Status:     STALE (exceeds {} min threshold)",
                    stale_minutes
                );
                println!();
                println!("Use `bistro lock clear --force` to clear it now.");
            }
        }
    }

    Ok(())
}

/// Execute the `bistro lock clear` command.
pub fn cmd_lock_clear(ctx: &AppContext, args: LockClearArgs) -> Result<()> {
    if !args.force {
        return Err(BistroError::UserError(
            "refusing to clear lock without --force flag.\n\n\
             Clearing the lock while a generation is being recorded can lose that record.\n\
             Only clear the lock if you are certain the holder has crashed.\n\n\
             To clear the lock, run:\n  bistro lock clear --force"
                .to_string(),
        ));
    }

    let lock_path = ctx.history_lock_path();
    let info = locks::inspect_lock(&lock_path, ctx.config.history.lock_stale_minutes);

    if !locks::clear_lock(&lock_path)? {
        println!("No history lock held.");
        return Ok(());
    }

    tracing::warn!(path = %lock_path.display(), "history lock cleared by operator");

    println!("Cleared lock: {}", lock_path.display());
    if let Some(info) = info {
        println!();
        println!("Lock details:");
        print_lock_details(&info);
    }

    Ok(())
}

fn print_lock_details(info: &LockInfo) {
    match &info.metadata {
        Some(meta) => {
            println!("  Owner:      {}", meta.owner);
            if let Some(pid) = meta.pid {
                println!("  PID:        {}", pid);
            }
            println!(
                "  Created:    {}",
                meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("  Age:        {}", meta.age_string());
            println!("  Action:     {}", meta.action);
        }
        None => println!("  Metadata:   unreadable"),
    }
    println!("  Path:       {}", info.path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_clear_requires_force() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();
        fs::write(ctx.history_lock_path(), "{}").unwrap();

        let err = cmd_lock_clear(&ctx, LockClearArgs { force: false }).unwrap_err();

        assert!(matches!(err, BistroError::UserError(_)));
        assert!(ctx.history_lock_path().exists());
    }

    #[test]
    fn test_clear_removes_held_lock() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();
        let guard = locks::acquire_lock(
            &ctx.history_lock_path(),
            "append",
            Duration::from_secs(1),
            ctx.config.history.lock_stale_minutes,
        )
        .unwrap();

        cmd_lock_clear(&ctx, LockClearArgs { force: true }).unwrap();

        assert!(!ctx.history_lock_path().exists());
        drop(guard);
    }

    #[test]
    fn test_clear_without_lock_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();

        cmd_lock_clear(&ctx, LockClearArgs { force: true }).unwrap();
        cmd_lock_status(&ctx).unwrap();
    }
}
