//! LLM backend port
//!
//! Defines the interface one language-generation backend must implement.
//! Timeout, retry, and failover live above this port in the
//! [`crate::gateway::GenerationGateway`]; an adapter only has to turn a
//! request into text or a [`BackendError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Backend identifier (e.g., "ollama", "openrouter")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        BackendId::new(s)
    }
}

/// One completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prompt: String,
}

/// Errors a backend call can produce
///
/// Response-validation failures are deliberately variants here: the gateway
/// treats an invalid response identically to a transport error when deciding
/// to fail over.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned an error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Backend configuration error: {0}")]
    Configuration(String),

    #[error("Response is empty after trimming")]
    EmptyResponse,

    #[error("Response exceeds the {limit}-character limit")]
    ResponseTooLong { limit: usize },

    #[error("Response echoes the prompt back")]
    PromptEcho,
}

/// A pluggable language-generation backend
///
/// Implementations (adapters) live in the infrastructure layer. A backend is
/// stateless from the port's point of view: no conversation data may be
/// cached behind this interface.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Stable identifier used in utterance metadata and failure chains
    fn id(&self) -> &BackendId;

    /// Produce a completion for the request
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}
