//! In-memory conversation store
//!
//! The durable storage engine proper is an external collaborator; this
//! adapter backs the CLI and tests with the same contract: load-by-id,
//! ordered history, and an atomic per-step commit. Different conversations
//! live under independent keys, so concurrent steps on different
//! conversations never contend on anything but the map lock.

use async_trait::async_trait;
use conclave_application::{ConversationStore, StoreError};
use conclave_domain::{Conversation, ConversationId, Message};
use std::collections::HashMap;
use std::sync::Mutex;

struct Record {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// `ConversationStore` backed by a process-local map
#[derive(Default)]
pub struct InMemoryConversationStore {
    records: Mutex<HashMap<ConversationId, Record>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, Record>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.contains_key(conversation.id()) {
            return Err(StoreError::AlreadyExists(conversation.id().clone()));
        }
        records.insert(
            conversation.id().clone(),
            Record {
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn load(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.lock()
            .get(id)
            .map(|record| record.conversation.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn history(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        self.lock()
            .get(id)
            .map(|record| record.messages.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn commit_step(
        &self,
        conversation: &Conversation,
        appended: &[Message],
    ) -> Result<(), StoreError> {
        let mut records = self.lock();
        let Some(record) = records.get_mut(conversation.id()) else {
            return Err(StoreError::NotFound(conversation.id().clone()));
        };

        // Appends must continue the stored sequence; anything else means two
        // writers raced, which the advance contract forbids.
        let mut expected = record.messages.len() as u64 + 1;
        for message in appended {
            if message.seq != expected {
                return Err(StoreError::Conflict(format!(
                    "append out of order: expected seq {}, got {}",
                    expected, message.seq
                )));
            }
            expected += 1;
        }

        record.conversation = conversation.clone();
        record.messages.extend_from_slice(appended);
        Ok(())
    }
}
