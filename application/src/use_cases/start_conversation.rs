//! Start conversation use case

use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::event_sink::{EventSink, StepEvent};
use conclave_domain::{Conversation, ConversationId, Goal};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Goal length bounds, matching what the API surface accepts
const MIN_GOAL_CHARS: usize = 10;
const MAX_GOAL_CHARS: usize = 2000;

#[derive(Error, Debug)]
pub enum StartConversationError {
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for the StartConversation use case
#[derive(Debug, Clone)]
pub struct StartConversationInput {
    pub id: ConversationId,
    pub goal: String,
}

/// Creates a conversation in its initial state
pub struct StartConversation {
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn EventSink>,
}

impl StartConversation {
    pub fn new(store: Arc<dyn ConversationStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    pub async fn execute(
        &self,
        input: StartConversationInput,
    ) -> Result<Conversation, StartConversationError> {
        let trimmed = input.goal.trim();
        let chars = trimmed.chars().count();
        if chars < MIN_GOAL_CHARS {
            return Err(StartConversationError::InvalidGoal(format!(
                "goal must be at least {} characters",
                MIN_GOAL_CHARS
            )));
        }
        if chars > MAX_GOAL_CHARS {
            return Err(StartConversationError::InvalidGoal(format!(
                "goal must be at most {} characters",
                MAX_GOAL_CHARS
            )));
        }
        let goal = Goal::try_new(trimmed)
            .ok_or_else(|| StartConversationError::InvalidGoal("goal is empty".to_string()))?;

        let conversation = Conversation::new(input.id, goal);
        self.store.create(&conversation).await?;
        info!(conversation = %conversation.id(), "conversation created");

        self.sink.emit(StepEvent::StatusChanged {
            conversation: conversation.id().clone(),
            status: conversation.status(),
        });

        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_sink::NoEventSink;
    use crate::use_cases::testing::MemoryStore;

    fn use_case(store: Arc<MemoryStore>) -> StartConversation {
        StartConversation::new(store, Arc::new(NoEventSink))
    }

    #[tokio::test]
    async fn test_start_creates_active_conversation() {
        let store = Arc::new(MemoryStore::default());
        let conversation = use_case(store.clone())
            .execute(StartConversationInput {
                id: ConversationId::new("c1"),
                goal: "Pick a queueing technology for the ingest path".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(conversation.status().as_str(), "active");
        assert!(store.load(&ConversationId::new("c1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_short_goal_rejected() {
        let store = Arc::new(MemoryStore::default());
        let err = use_case(store)
            .execute(StartConversationInput {
                id: ConversationId::new("c1"),
                goal: "too short".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StartConversationError::InvalidGoal(_)));
    }

    #[tokio::test]
    async fn test_oversized_goal_rejected() {
        let store = Arc::new(MemoryStore::default());
        let err = use_case(store)
            .execute(StartConversationInput {
                id: ConversationId::new("c1"),
                goal: "g".repeat(2001),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StartConversationError::InvalidGoal(_)));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = Arc::new(MemoryStore::default());
        let use_case = use_case(store);
        let input = StartConversationInput {
            id: ConversationId::new("c1"),
            goal: "Pick a queueing technology".to_string(),
        };
        use_case.execute(input.clone()).await.unwrap();
        let err = use_case.execute(input).await.unwrap_err();
        assert!(matches!(
            err,
            StartConversationError::Store(StoreError::AlreadyExists(_))
        ));
    }
}
