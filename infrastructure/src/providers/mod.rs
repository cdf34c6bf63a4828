//! LLM backend adapters

pub mod ollama;
pub mod openrouter;

pub use ollama::OllamaBackend;
pub use openrouter::OpenRouterBackend;

use crate::config::FileConfig;
use conclave_application::LlmBackend;
use std::sync::Arc;
use tracing::warn;

/// Build a backend by the name used in `[generation]`
///
/// Returns `None` (with a warning) when the named backend cannot be
/// constructed — e.g., OpenRouter without an API key — so a missing failover
/// degrades to a single-backend gateway instead of refusing to start.
pub fn build_backend(name: &str, config: &FileConfig) -> Option<Arc<dyn LlmBackend>> {
    match name {
        "ollama" => Some(Arc::new(OllamaBackend::new(&config.providers.ollama))),
        "openrouter" => match OpenRouterBackend::new(&config.providers.openrouter) {
            Ok(backend) => Some(Arc::new(backend)),
            Err(error) => {
                warn!(backend = name, %error, "backend unavailable");
                None
            }
        },
        other => {
            warn!(backend = other, "unknown backend name");
            None
        }
    }
}
