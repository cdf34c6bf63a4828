//! Generation gateway
//!
//! Uniform front for the pluggable language-generation backends. One
//! `generate` call runs the full failover ladder for a single turn:
//!
//! 1. preferred backend, bounded timeout
//! 2. one retry on the preferred backend after a short backoff
//! 3. the secondary backend, with its own bounded timeout
//!
//! Response validation failures count as backend errors at every rung. When
//! the ladder is exhausted the caller gets a [`GenerationFailure`] carrying
//! the whole error chain — the phase controller treats that as a recoverable
//! per-turn failure, never as conversation-fatal.
//!
//! The gateway keeps no conversation state. Its only memory is the shared
//! backend-health window: after the preferred backend fails a full turn, the
//! next few calls (across all conversations) skip straight to the secondary.

mod health;
mod validation;

use crate::ports::llm_backend::{BackendError, BackendId, CompletionRequest, LlmBackend};
use conclave_domain::{ConversationContext, PromptTemplate};
use health::BackendHealth;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use validation::validate_response;

/// Tuning for one gateway instance
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    /// Per-call timeout for the preferred backend
    pub preferred_timeout: Duration,
    /// Per-call timeout for the secondary backend
    pub secondary_timeout: Duration,
    /// Pause before the in-turn retry on the preferred backend
    pub retry_backoff: Duration,
    /// Maximum accepted response length in characters
    pub max_response_chars: usize,
    /// Calls that skip straight to the secondary after the preferred backend
    /// fails a full turn
    pub degrade_window: u32,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            preferred_timeout: Duration::from_secs(30),
            secondary_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(500),
            max_response_chars: 5000,
            degrade_window: 5,
        }
    }
}

/// A successful generation
#[derive(Debug, Clone)]
pub struct UtteranceResult {
    pub text: String,
    /// Which backend actually produced the text
    pub backend: BackendId,
    pub latency: Duration,
}

/// One failed rung of the failover ladder
#[derive(Debug)]
pub struct AttemptFailure {
    pub backend: BackendId,
    pub error: BackendError,
}

/// Every configured backend failed for this turn
///
/// Carries the whole attempt chain so no rung's error is lost.
#[derive(Debug)]
pub struct GenerationFailure {
    pub attempts: Vec<AttemptFailure>,
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "All generation backends failed")?;
        for attempt in &self.attempts {
            write!(f, "; {}: {}", attempt.backend, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationFailure {}

/// Gateway over an ordered pair of backends
pub struct GenerationGateway {
    preferred: Arc<dyn LlmBackend>,
    secondary: Option<Arc<dyn LlmBackend>>,
    policy: GenerationPolicy,
    health: BackendHealth,
}

impl GenerationGateway {
    pub fn new(
        preferred: Arc<dyn LlmBackend>,
        secondary: Option<Arc<dyn LlmBackend>>,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            preferred,
            secondary,
            policy,
            health: BackendHealth::default(),
        }
    }

    /// Generate one utterance for the given context
    ///
    /// Cancellation-safe: dropping the returned future abandons the in-flight
    /// backend call without any other side effect, so an utterance is either
    /// fully produced or not produced at all.
    pub async fn generate(
        &self,
        context: &ConversationContext<'_>,
    ) -> Result<UtteranceResult, GenerationFailure> {
        let request = CompletionRequest {
            system_prompt: PromptTemplate::system_prompt(context),
            prompt: PromptTemplate::turn_prompt(context),
        };

        let mut attempts = Vec::new();

        if self.health.should_skip_preferred()
            && let Some(secondary) = &self.secondary
        {
            debug!(backend = %secondary.id(), "preferred backend degraded, going straight to secondary");
            match self
                .attempt(secondary.as_ref(), &request, self.policy.secondary_timeout)
                .await
            {
                Ok(result) => return Ok(result),
                Err(failure) => attempts.push(failure),
            }
            // Secondary is down too; the preferred backend is the last hope
            // for this turn even while degraded.
            match self
                .attempt(
                    self.preferred.as_ref(),
                    &request,
                    self.policy.preferred_timeout,
                )
                .await
            {
                Ok(result) => {
                    self.health.mark_healthy();
                    return Ok(result);
                }
                Err(failure) => attempts.push(failure),
            }
            return Err(GenerationFailure { attempts });
        }

        // Healthy ladder: preferred, retry preferred, secondary.
        match self
            .attempt(
                self.preferred.as_ref(),
                &request,
                self.policy.preferred_timeout,
            )
            .await
        {
            Ok(result) => {
                self.health.mark_healthy();
                return Ok(result);
            }
            Err(failure) => {
                warn!(backend = %failure.backend, error = %failure.error, "preferred backend failed, retrying");
                attempts.push(failure);
            }
        }

        tokio::time::sleep(self.policy.retry_backoff).await;

        match self
            .attempt(
                self.preferred.as_ref(),
                &request,
                self.policy.preferred_timeout,
            )
            .await
        {
            Ok(result) => {
                self.health.mark_healthy();
                return Ok(result);
            }
            Err(failure) => {
                warn!(backend = %failure.backend, error = %failure.error, "preferred backend retry failed");
                attempts.push(failure);
            }
        }

        self.health.mark_degraded(self.policy.degrade_window);

        if let Some(secondary) = &self.secondary {
            match self
                .attempt(secondary.as_ref(), &request, self.policy.secondary_timeout)
                .await
            {
                Ok(result) => return Ok(result),
                Err(failure) => {
                    warn!(backend = %failure.backend, error = %failure.error, "secondary backend failed");
                    attempts.push(failure);
                }
            }
        }

        Err(GenerationFailure { attempts })
    }

    async fn attempt(
        &self,
        backend: &dyn LlmBackend,
        request: &CompletionRequest,
        timeout: Duration,
    ) -> Result<UtteranceResult, AttemptFailure> {
        let backend_id = backend.id().clone();
        let started = Instant::now();

        let outcome = tokio::time::timeout(timeout, backend.complete(request)).await;
        let raw = match outcome {
            Err(_) => {
                return Err(AttemptFailure {
                    backend: backend_id,
                    error: BackendError::Timeout(timeout),
                });
            }
            Ok(Err(error)) => {
                return Err(AttemptFailure {
                    backend: backend_id,
                    error,
                });
            }
            Ok(Ok(text)) => text,
        };

        match validate_response(&raw, request, self.policy.max_response_chars) {
            Ok(text) => Ok(UtteranceResult {
                text,
                backend: backend_id,
                latency: started.elapsed(),
            }),
            Err(error) => Err(AttemptFailure {
                backend: backend_id,
                error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conclave_domain::{Goal, Participant, Phase, Role};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // -- Mock LlmBackend -------------------------------------------------------

    enum Scripted {
        Reply(String),
        Fail(String),
        Hang,
    }

    struct ScriptedBackend {
        id: BackendId,
        script: Mutex<VecDeque<Scripted>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(id: &str, script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                id: BackendId::new(id),
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        fn id(&self) -> &BackendId {
            &self.id
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Reply(text)) => Ok(text),
                Some(Scripted::Fail(reason)) => Err(BackendError::Transport(reason)),
                Some(Scripted::Hang) | None => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    fn fast_policy() -> GenerationPolicy {
        GenerationPolicy {
            preferred_timeout: Duration::from_millis(50),
            secondary_timeout: Duration::from_millis(50),
            retry_backoff: Duration::from_millis(1),
            max_response_chars: 5000,
            degrade_window: 2,
        }
    }

    async fn generate(gateway: &GenerationGateway) -> Result<UtteranceResult, GenerationFailure> {
        let goal = Goal::new("Pick a cache");
        let participant = Participant::new("sam", "Sam", Role::Architect, "You are Sam.");
        let context = ConversationContext::speaking(&goal, Phase::Exploring, &participant, &[]);
        gateway.generate(&context).await
    }

    #[tokio::test]
    async fn test_preferred_success_first_try() {
        let preferred = ScriptedBackend::new("ollama", vec![Scripted::Reply("fine answer".into())]);
        let secondary = ScriptedBackend::new("openrouter", vec![]);
        let gateway = GenerationGateway::new(
            preferred.clone(),
            Some(secondary.clone()),
            fast_policy(),
        );

        let result = generate(&gateway).await.unwrap();
        assert_eq!(result.text, "fine answer");
        assert_eq!(result.backend.as_str(), "ollama");
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_failover_tags_secondary_and_hides_preferred_error() {
        let preferred = ScriptedBackend::new(
            "ollama",
            vec![
                Scripted::Fail("connection refused".into()),
                Scripted::Fail("connection refused".into()),
            ],
        );
        let secondary =
            ScriptedBackend::new("openrouter", vec![Scripted::Reply("backup answer".into())]);
        let gateway =
            GenerationGateway::new(preferred.clone(), Some(secondary.clone()), fast_policy());

        let result = generate(&gateway).await.unwrap();
        assert_eq!(result.backend.as_str(), "openrouter");
        assert_eq!(result.text, "backup answer");
        // One initial call plus one retry before failover.
        assert_eq!(preferred.calls(), 2);
    }

    #[tokio::test]
    async fn test_all_backends_failing_returns_full_chain() {
        let preferred = ScriptedBackend::new(
            "ollama",
            vec![Scripted::Fail("down".into()), Scripted::Fail("down".into())],
        );
        let secondary =
            ScriptedBackend::new("openrouter", vec![Scripted::Fail("quota exceeded".into())]);
        let gateway = GenerationGateway::new(preferred, Some(secondary), fast_policy());

        let failure = generate(&gateway).await.unwrap_err();
        assert_eq!(failure.attempts.len(), 3);
        assert_eq!(failure.attempts[0].backend.as_str(), "ollama");
        assert_eq!(failure.attempts[2].backend.as_str(), "openrouter");
        assert!(failure.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let preferred = ScriptedBackend::new("ollama", vec![Scripted::Hang, Scripted::Hang]);
        let secondary =
            ScriptedBackend::new("openrouter", vec![Scripted::Reply("rescued".into())]);
        let gateway = GenerationGateway::new(preferred, Some(secondary), fast_policy());

        let result = generate(&gateway).await.unwrap();
        assert_eq!(result.backend.as_str(), "openrouter");
    }

    #[tokio::test]
    async fn test_empty_response_fails_over() {
        let preferred = ScriptedBackend::new(
            "ollama",
            vec![
                Scripted::Reply("   ".into()),
                Scripted::Reply("\n\t".into()),
            ],
        );
        let secondary =
            ScriptedBackend::new("openrouter", vec![Scripted::Reply("real answer".into())]);
        let gateway = GenerationGateway::new(preferred, Some(secondary), fast_policy());

        let result = generate(&gateway).await.unwrap();
        assert_eq!(result.backend.as_str(), "openrouter");
    }

    #[tokio::test]
    async fn test_degrade_window_skips_preferred() {
        let preferred = ScriptedBackend::new(
            "ollama",
            vec![Scripted::Fail("down".into()), Scripted::Fail("down".into())],
        );
        let secondary = ScriptedBackend::new(
            "openrouter",
            vec![
                Scripted::Reply("first".into()),
                Scripted::Reply("second".into()),
            ],
        );
        let gateway =
            GenerationGateway::new(preferred.clone(), Some(secondary.clone()), fast_policy());

        // Turn 1: preferred fails twice, secondary rescues, window opens.
        let first = generate(&gateway).await.unwrap();
        assert_eq!(first.backend.as_str(), "openrouter");
        assert_eq!(preferred.calls(), 2);

        // Turn 2: preferred is skipped entirely.
        let second = generate(&gateway).await.unwrap();
        assert_eq!(second.backend.as_str(), "openrouter");
        assert_eq!(preferred.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_secondary_configured() {
        let preferred = ScriptedBackend::new(
            "ollama",
            vec![Scripted::Fail("down".into()), Scripted::Fail("down".into())],
        );
        let gateway = GenerationGateway::new(preferred, None, fast_policy());

        let failure = generate(&gateway).await.unwrap_err();
        assert_eq!(failure.attempts.len(), 2);
    }
}
