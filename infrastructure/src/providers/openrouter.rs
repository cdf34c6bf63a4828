//! OpenRouter backend adapter
//!
//! OpenAI-compatible `POST {base_url}/chat/completions` with bearer auth.

use crate::config::OpenRouterSection;
use async_trait::async_trait;
use conclave_application::{BackendError, BackendId, CompletionRequest, LlmBackend};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// `LlmBackend` over the OpenRouter HTTP API
pub struct OpenRouterBackend {
    id: BackendId,
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterBackend {
    /// Fails when no API key is configured
    pub fn new(config: &OpenRouterSection) -> Result<Self, BackendError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                BackendError::Configuration("OpenRouter API key is not configured".to_string())
            })?
            .to_string();

        Ok(Self {
            id: BackendId::new("openrouter"),
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };
        debug!(model = %self.model, "sending OpenRouter chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| BackendError::Api(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Malformed("response carried no choices".to_string()))
    }
}
