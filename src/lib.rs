//! Bistro: template-driven social posts and review replies for a restaurant.
//!
//! A request is rendered into a prompt from an editable template, sent to a
//! local Ollama model, and the generated text is appended to a durable JSON
//! history log that can be exported as CSV. The `bistro` binary in this
//! package is a thin command-line layer over these modules.

pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod generation;
pub mod history;
pub mod locks;
pub mod logging;
pub mod orchestrator;
pub mod template;
pub mod uploads;

#[cfg(test)]
mod test_support;
