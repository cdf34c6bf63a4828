//! Storage collaborator port
//!
//! The core treats storage as durable and linearizable per conversation. The
//! one transactional demand: `commit_step` must apply the conversation
//! update and the message appends together or not at all.

use async_trait::async_trait;
use conclave_domain::{Conversation, ConversationId, Message};
use thiserror::Error;

/// Errors surfaced by a store adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Conversation already exists: {0}")]
    AlreadyExists(ConversationId),

    #[error("Store rejected the step: {0}")]
    Conflict(String),

    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// Durable conversation + message-log storage
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a newly created conversation
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Load a conversation by id
    async fn load(&self, id: &ConversationId) -> Result<Conversation, StoreError>;

    /// Message history in insertion order with assigned sequence numbers
    async fn history(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError>;

    /// Apply one completed step: upsert the conversation's mutable fields and
    /// append the new messages, atomically
    async fn commit_step(
        &self,
        conversation: &Conversation,
        appended: &[Message],
    ) -> Result<(), StoreError>;
}
