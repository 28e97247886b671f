//! Prompt template rendering.
//!
//! This module provides:
//!
//! - **Engine**: the pure `{{ name }}` substitution function
//! - **Store**: lookup of template text by logical identifier
//!
//! # Template Syntax
//!
//! ```text
//! Write a {{ tone }} caption for "{{ dish_name }}".
//! Theme: {{ theme }}
//! ```

mod engine;
mod store;

pub use engine::{TemplateError, referenced_variables, render_template};
pub use store::{DEFAULT_REVIEW_REPLY_TEMPLATE, DEFAULT_SOCIAL_POST_TEMPLATE, TemplateStore};
