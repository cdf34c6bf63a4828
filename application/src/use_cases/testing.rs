//! Shared test doubles for use-case tests
//!
//! Mirrors the infrastructure adapters closely enough that controller tests
//! exercise the same contracts the real adapters implement.

use crate::gateway::{GenerationGateway, GenerationPolicy};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::llm_backend::{BackendError, BackendId, CompletionRequest, LlmBackend};
use async_trait::async_trait;
use conclave_domain::{Conversation, ConversationId, Message};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory `ConversationStore` for tests
#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<HashMap<ConversationId, (Conversation, Vec<Message>)>>,
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(conversation.id()) {
            return Err(StoreError::AlreadyExists(conversation.id().clone()));
        }
        records.insert(
            conversation.id().clone(),
            (conversation.clone(), Vec::new()),
        );
        Ok(())
    }

    async fn load(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(id)
            .map(|(conversation, _)| conversation.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn history(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(id)
            .map(|(_, messages)| messages.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn commit_step(
        &self,
        conversation: &Conversation,
        appended: &[Message],
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(conversation.id()) else {
            return Err(StoreError::NotFound(conversation.id().clone()));
        };
        record.0 = conversation.clone();
        record.1.extend_from_slice(appended);
        Ok(())
    }
}

/// Scripted `LlmBackend`: pops queued replies, then repeats the fallback
pub(crate) struct QueueBackend {
    id: BackendId,
    queue: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    fail_always: bool,
    hang: bool,
}

impl QueueBackend {
    /// Replies in order; errors once the script runs dry
    pub(crate) fn scripted(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            id: BackendId::new("scripted"),
            queue: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            fallback: None,
            fail_always: false,
            hang: false,
        })
    }

    /// The same reply forever
    pub(crate) fn repeating(text: &str) -> Arc<Self> {
        Arc::new(Self {
            id: BackendId::new("repeating"),
            queue: Mutex::new(VecDeque::new()),
            fallback: Some(text.to_string()),
            fail_always: false,
            hang: false,
        })
    }

    /// Every call fails
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            id: BackendId::new("failing"),
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            fail_always: true,
            hang: false,
        })
    }

    /// Every call blocks until the surrounding timeout fires
    pub(crate) fn hanging() -> Arc<Self> {
        Arc::new(Self {
            id: BackendId::new("hanging"),
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            fail_always: false,
            hang: true,
        })
    }
}

#[async_trait]
impl LlmBackend for QueueBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if self.fail_always {
            return Err(BackendError::Transport("scripted failure".to_string()));
        }
        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            return Ok(next);
        }
        match &self.fallback {
            Some(text) => Ok(text.clone()),
            None => Err(BackendError::Transport("script exhausted".to_string())),
        }
    }
}

/// Gateway over a single test backend with test-friendly timings
pub(crate) fn test_gateway(backend: Arc<dyn LlmBackend>) -> Arc<GenerationGateway> {
    Arc::new(GenerationGateway::new(
        backend,
        None,
        GenerationPolicy {
            preferred_timeout: Duration::from_secs(5),
            secondary_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(1),
            max_response_chars: 5000,
            degrade_window: 0,
        },
    ))
}
