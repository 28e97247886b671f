//! CLI argument parsing for bistro.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Bistro: generate restaurant social posts and review replies with a local model.
///
/// Prompts are rendered from editable templates, sent to an Ollama server,
/// and every successful generation is appended to a JSON history log that
/// can be exported as CSV.
#[derive(Parser, Debug)]
#[command(name = "bistro")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding bistro.yaml, templates, history, and uploads.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Model to generate with (overrides `model_id` from bistro.yaml).
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Increase log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for bistro.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a data directory.
    ///
    /// Creates bistro.yaml, the default prompt templates, and the uploads
    /// directory. Existing files are left untouched.
    Init,

    /// Generate a social media caption for a dish.
    ///
    /// Prints `{"caption": "..."}` and records the generation in history.
    Post(PostArgs),

    /// Generate a reply to a customer review.
    ///
    /// Prints `{"reply": "..."}` and records the generation in history.
    Reply(ReplyArgs),

    /// Print the generation history as JSON.
    History(HistoryArgs),

    /// Export the generation history as CSV.
    Export,

    /// History lock management commands.
    ///
    /// Inspect or clear the lock file guarding the history log.
    Lock(LockCommand),
}

/// Arguments for the `post` command.
#[derive(Parser, Debug)]
pub struct PostArgs {
    /// Name of the dish.
    #[arg(long = "dish")]
    pub dish_name: String,

    /// Theme of the post (e.g. "Italian night").
    #[arg(long)]
    pub theme: String,

    /// Tone of voice (e.g. fun, elegant).
    #[arg(long)]
    pub tone: String,

    /// Image to attach; copied into the uploads directory.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
}

/// Arguments for the `reply` command.
#[derive(Parser, Debug)]
pub struct ReplyArgs {
    /// Text of the customer review.
    #[arg(long = "review")]
    pub review_text: String,

    /// Sentiment of the review (e.g. positive, negative).
    #[arg(long)]
    pub sentiment: String,

    /// Tone of voice for the reply.
    #[arg(long)]
    pub tone: String,
}

/// Arguments for the `history` command.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Only show entries of this type (social_post or review_reply).
    ///
    /// An unknown type shows the full history.
    #[arg(long = "type", value_name = "TYPE")]
    pub entry_type: Option<String>,
}

/// Lock subcommand wrapper.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show whether the history lock is held, by whom, and for how long.
    Status,

    /// Remove the history lock file.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
