//! Response validation
//!
//! A response that fails validation counts as a backend error for failover
//! purposes: empty after trimming, longer than the configured limit, or a
//! plain echo of the prompt.

use crate::ports::llm_backend::{BackendError, CompletionRequest};

pub(crate) fn validate_response(
    text: &str,
    request: &CompletionRequest,
    limit: usize,
) -> Result<String, BackendError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    if trimmed.chars().count() > limit {
        return Err(BackendError::ResponseTooLong { limit });
    }
    if trimmed == request.prompt.trim() || trimmed == request.system_prompt.trim() {
        return Err(BackendError::PromptEcho);
    }
    Ok(trimmed.to_string())
}
