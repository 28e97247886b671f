//! Generation pipeline.
//!
//! Every request, whatever its type, runs the same steps:
//!
//! 1. Validate that the request carries its type's required fields
//! 2. Render the type's template with the request fields
//! 3. Ask the generation client for text using the configured model
//! 4. Append `{type, input, output}` to the history log
//! 5. Return the generated text
//!
//! Steps 1-3 fail the request. A failure in step 4 does not: the text is
//! still returned and the failure is logged and reported in the outcome.

use crate::error::{BistroError, Result};
use crate::generation::GenerationClient;
use crate::history::{EntryType, HistoryEntry, HistoryStore};
use crate::template::TemplateStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    SocialPost {
        dish_name: String,
        theme: String,
        tone: String,
        /// Stored path of an uploaded image, if any.
        image_reference: Option<String>,
    },
    ReviewReply {
        review_text: String,
        sentiment: String,
        tone: String,
    },
}

impl GenerationRequest {
    /// Build a request of `entry_type` from loose named fields.
    ///
    /// Fields the type does not know about are ignored.
    ///
    /// # Returns
    ///
    /// * `Err(BistroError::InvalidRequest)` - A required field is absent
    pub fn from_fields(entry_type: EntryType, fields: &BTreeMap<String, String>) -> Result<Self> {
        let missing: Vec<&str> = entry_type
            .required_fields()
            .iter()
            .copied()
            .filter(|name| !fields.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(BistroError::InvalidRequest(format!(
                "{} request is missing required field(s): {}",
                entry_type,
                missing.join(", ")
            )));
        }

        let known = |name: &str| {
            entry_type.required_fields().contains(&name)
                || entry_type.optional_fields().contains(&name)
        };
        let ignored: Vec<&str> = fields
            .keys()
            .map(String::as_str)
            .filter(|name| !known(*name))
            .collect();
        if !ignored.is_empty() {
            tracing::debug!(entry_type = %entry_type, ?ignored, "ignoring unknown request fields");
        }

        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();

        Ok(match entry_type {
            EntryType::SocialPost => GenerationRequest::SocialPost {
                dish_name: field("dish_name"),
                theme: field("theme"),
                tone: field("tone"),
                image_reference: fields.get("image_reference").cloned(),
            },
            EntryType::ReviewReply => GenerationRequest::ReviewReply {
                review_text: field("review_text"),
                sentiment: field("sentiment"),
                tone: field("tone"),
            },
        })
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            GenerationRequest::SocialPost { .. } => EntryType::SocialPost,
            GenerationRequest::ReviewReply { .. } => EntryType::ReviewReply,
        }
    }

    /// The request as named fields: template variables and the logged input.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        match self {
            GenerationRequest::SocialPost {
                dish_name,
                theme,
                tone,
                image_reference,
            } => {
                fields.insert("dish_name".to_string(), dish_name.clone());
                fields.insert("theme".to_string(), theme.clone());
                fields.insert("tone".to_string(), tone.clone());
                if let Some(image) = image_reference {
                    fields.insert("image_reference".to_string(), image.clone());
                }
            }
            GenerationRequest::ReviewReply {
                review_text,
                sentiment,
                tone,
            } => {
                fields.insert("review_text".to_string(), review_text.clone());
                fields.insert("sentiment".to_string(), sentiment.clone());
                fields.insert("tone".to_string(), tone.clone());
            }
        }
        fields
    }
}

/// What happened to the history record of a successful generation.
#[derive(Debug)]
pub enum Persistence {
    Stored(HistoryEntry),
    Failed(BistroError),
}

/// Result of a successful generation.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub entry_type: EntryType,
    pub text: String,
    pub persistence: Persistence,
}

impl GenerationOutcome {
    /// Whether the generation made it into the history log.
    pub fn is_persisted(&self) -> bool {
        matches!(self.persistence, Persistence::Stored(_))
    }

    /// Caller-facing response, e.g. `{"caption": "..."}`.
    pub fn response_json(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.entry_type.response_key().to_string(),
            Value::String(self.text.clone()),
        );
        Value::Object(body)
    }
}

/// Runs generation requests against one template store, client, and log.
pub struct Orchestrator<C: GenerationClient> {
    templates: TemplateStore,
    client: C,
    store: Arc<HistoryStore>,
    model_id: String,
}

impl<C: GenerationClient> Orchestrator<C> {
    pub fn new(
        templates: TemplateStore,
        client: C,
        store: Arc<HistoryStore>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            client,
            store,
            model_id: model_id.into(),
        }
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Run the pipeline for `request`.
    ///
    /// # Returns
    ///
    /// * `Ok(GenerationOutcome)` - Text was generated; check `persistence` for the log write
    /// * `Err(BistroError::TemplateNotFound | RenderError)` - The prompt could not be built
    /// * `Err(BistroError::Backend*)` - The client failed; nothing is logged to history
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let entry_type = request.entry_type();
        let fields = request.fields();

        let prompt = self.templates.render(entry_type.template_id(), &fields)?;

        let text = match self.client.generate(&self.model_id, &prompt) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    entry_type = %entry_type,
                    model = %self.model_id,
                    error = %e,
                    "generation failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            entry_type = %entry_type,
            model = %self.model_id,
            chars = text.chars().count(),
            "generated text"
        );

        let persistence = match self.store.append(entry_type, fields, text.clone()) {
            Ok(entry) => Persistence::Stored(entry),
            Err(e) => {
                tracing::error!(
                    entry_type = %entry_type,
                    log = %self.store.log_path().display(),
                    error = %e,
                    "failed to record generation in history"
                );
                Persistence::Failed(e)
            }
        };

        Ok(GenerationOutcome {
            entry_type,
            text,
            persistence,
        })
    }

    /// Validate loose fields as `entry_type` and run the pipeline.
    pub fn generate_from_fields(
        &self,
        entry_type: EntryType,
        fields: &BTreeMap<String, String>,
    ) -> Result<GenerationOutcome> {
        let request = GenerationRequest::from_fields(entry_type, fields)?;
        self.generate(&request)
    }
}
