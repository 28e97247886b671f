//! Ollama chat client (`POST /api/chat`, non-streaming).

use super::GenerationClient;
use crate::config::Config;
use crate::error::{BistroError, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// Blocking client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Create a client for `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BistroError::UserError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Create a client from the `backend` section of the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.backend.base_url,
            config.backend_timeout(),
            config.backend_connect_timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

impl GenerationClient for OllamaClient {
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": model_id,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        tracing::debug!(url = %self.url(), model = model_id, "sending chat request");

        let response = self
            .http
            .post(self.url())
            .json(&payload)
            .send()
            .map_err(|e| classify_transport_error(&self.base_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| classify_transport_error(&self.base_url, e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(BistroError::BackendError(format!("HTTP {}: {}", status, detail)));
        }

        parse_chat_response(&body)
    }
}

/// Extract `message.content` from a non-streaming chat response body.
fn parse_chat_response(body: &str) -> Result<String> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| BistroError::BackendError(format!("invalid response JSON: {}", e)))?;

    if let Some(err) = v.get("error") {
        let msg = err.as_str().unwrap_or("unknown error");
        return Err(BistroError::BackendError(msg.to_string()));
    }

    v["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BistroError::BackendError("response has no message.content".to_string()))
}

fn classify_transport_error(base_url: &str, e: reqwest::Error) -> BistroError {
    if e.is_timeout() {
        BistroError::BackendTimeout(format!("{}: {}", base_url, e))
    } else if e.is_connect() || e.is_request() {
        BistroError::BackendUnavailable(format!("{}: {}", base_url, e))
    } else {
        BistroError::BackendError(format!("{}: {}", base_url, e))
    }
}
