//! Text generation backends.
//!
//! The orchestrator only sees [`GenerationClient`]; the Ollama HTTP client is
//! one implementation of it.

mod ollama;

pub use ollama::OllamaClient;

use crate::error::Result;

/// Turns a rendered prompt into generated text.
///
/// Implementations block until the backend answers or the request times
/// out, and never retry.
pub trait GenerationClient: Send + Sync {
    /// Generate text for `prompt` with the model named `model_id`.
    ///
    /// # Returns
    ///
    /// * `Err(BistroError::BackendUnavailable)` - The backend could not be reached
    /// * `Err(BistroError::BackendTimeout)` - The backend did not answer in time
    /// * `Err(BistroError::BackendError)` - The backend failed or returned an unusable body
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String>;
}

impl<T: GenerationClient + ?Sized> GenerationClient for &T {
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String> {
        (**self).generate(model_id, prompt)
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String> {
        (**self).generate(model_id, prompt)
    }
}
