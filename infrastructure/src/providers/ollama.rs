//! Ollama backend adapter
//!
//! Talks to a local Ollama server via `POST {base_url}/api/generate` with
//! streaming disabled. Timeouts are enforced by the generation gateway, not
//! here.

use crate::config::OllamaSection;
use async_trait::async_trait;
use conclave_application::{BackendError, BackendId, CompletionRequest, LlmBackend};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// `LlmBackend` over the Ollama HTTP API
pub struct OllamaBackend {
    id: BackendId,
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &OllamaSection) -> Self {
        Self {
            id: BackendId::new("ollama"),
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let body = GenerateRequest {
            model: &self.model,
            system: &request.system_prompt,
            prompt: &request.prompt,
            stream: false,
        };
        debug!(model = %self.model, "sending Ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| BackendError::Api(e.to_string()))?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        Ok(parsed.response)
    }
}
