//! Submit human reply use case
//!
//! The human-input collaborator's single operation: append the reply through
//! the message router (threaded under the question it answers) and release
//! the `awaiting_human` pause so the next `advance()` continues the phase
//! that was interrupted.

use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::event_sink::{EventSink, StepEvent};
use conclave_domain::{
    ConversationId, ConversationStatus, InvalidMessageError, Message, MessageDraft, MessageRouter,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SubmitHumanReplyError {
    #[error("Conversation {0} has no pending question for the human")]
    NoPendingQuestion(ConversationId),

    #[error("Conversation {0} is finished and cannot accept replies")]
    ConversationFinished(ConversationId),

    #[error(transparent)]
    InvalidMessage(#[from] InvalidMessageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Appends a `human_reply` and wakes the conversation
pub struct SubmitHumanReply {
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn EventSink>,
}

impl SubmitHumanReply {
    pub fn new(store: Arc<dyn ConversationStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    pub async fn execute(
        &self,
        id: &ConversationId,
        content: impl Into<String>,
    ) -> Result<Message, SubmitHumanReplyError> {
        let mut conversation = self.store.load(id).await?;
        if conversation.status().is_terminal() {
            return Err(SubmitHumanReplyError::ConversationFinished(id.clone()));
        }

        let history = self.store.history(id).await?;
        let mut router = MessageRouter::from_history(id.clone(), history)?;

        let Some(question) = router.pending_human_question() else {
            return Err(SubmitHumanReplyError::NoPendingQuestion(id.clone()));
        };
        let question_id = question.id.clone();

        let message = router
            .append(MessageDraft::human_reply(content).with_parent(question_id))?
            .clone();

        let status_before = conversation.status();
        conversation.resume();

        self.store
            .commit_step(&conversation, router.appended())
            .await?;

        info!(conversation = %id, "human reply accepted, conversation resumed");
        self.sink.emit(StepEvent::MessageAppended {
            conversation: id.clone(),
            message: message.clone(),
        });
        if conversation.status() != status_before {
            self.sink.emit(StepEvent::StatusChanged {
                conversation: id.clone(),
                status: ConversationStatus::Active,
            });
        }

        Ok(message)
    }
}
