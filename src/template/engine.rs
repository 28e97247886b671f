//! Template engine for variable substitution.
//!
//! Prompt templates use `{{ name }}` placeholders, the same form the prompt
//! files have always been written in. Only plain variable substitution is
//! supported.
//!
//! # Syntax
//!
//! - `{{name}}` or `{{ name }}` - Substitutes the value of variable `name`
//! - a single `{` or `}` - Rendered literally
//!
//! # Error Handling
//!
//! The engine is fail-safe: undefined variables cause an error rather than
//! silent substitution with empty strings, so a request missing a field can
//! never produce a prompt with a hole in it.

use std::collections::BTreeMap;
use std::fmt;

/// Error type for template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A variable was referenced but not provided.
    UndefinedVariable {
        /// The name of the undefined variable.
        name: String,
        /// Byte offset of the placeholder in the template.
        position: usize,
    },
    /// A `{{` was found without a matching `}}`.
    UnterminatedPlaceholder {
        /// Byte offset of the unterminated `{{`.
        position: usize,
    },
    /// An empty placeholder was found (e.g., `{{ }}`).
    EmptyVariableName {
        /// Byte offset of the empty placeholder.
        position: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedVariable { name, position } => {
                write!(
                    f,
                    "undefined variable '{}' at position {} in template",
                    name, position
                )
            }
            TemplateError::UnterminatedPlaceholder { position } => {
                write!(
                    f,
                    "unterminated '{{{{' at position {} in template",
                    position
                )
            }
            TemplateError::EmptyVariableName { position } => {
                write!(
                    f,
                    "empty placeholder '{{{{ }}}}' at position {} in template",
                    position
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Render a template string by substituting variables.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use bistro::template::render_template;
///
/// let mut vars = BTreeMap::new();
/// vars.insert("dish_name".to_string(), "Pasta".to_string());
///
/// let result = render_template("Write a post about {{ dish_name }}.", &vars).unwrap();
/// assert_eq!(result, "Write a post about Pasta.");
/// ```
pub fn render_template(
    template: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let position = offset + open;
        let after_open = &rest[open + 2..];

        let close = after_open
            .find("}}")
            .ok_or(TemplateError::UnterminatedPlaceholder { position })?;

        let name = after_open[..close].trim();
        if name.is_empty() {
            return Err(TemplateError::EmptyVariableName { position });
        }

        match variables.get(name) {
            Some(value) => result.push_str(value),
            None => {
                return Err(TemplateError::UndefinedVariable {
                    name: name.to_string(),
                    position,
                });
            }
        }

        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }

    result.push_str(rest);
    Ok(result)
}

/// Collect the distinct variable names a template references, in order of
/// first appearance. Stops at the first malformed placeholder.
pub fn referenced_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..close].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after_open[close + 2..];
    }

    names
}
