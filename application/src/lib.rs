//! Application layer for conclave
//!
//! This crate contains the use cases that drive a conversation (the phase
//! controller, conversation creation, human replies), the generation gateway
//! with its failover ladder, and the port definitions external collaborators
//! implement. It depends only on the domain layer.

pub mod config;
pub mod gateway;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{Budgets, ConversationSettings};
pub use gateway::{
    AttemptFailure, GenerationFailure, GenerationGateway, GenerationPolicy, UtteranceResult,
};
pub use ports::{
    conversation_store::{ConversationStore, StoreError},
    event_sink::{EventSink, NoEventSink, StepEvent},
    llm_backend::{BackendError, BackendId, CompletionRequest, LlmBackend},
};
pub use use_cases::{
    AdvanceError, AdvanceOutcome, PhaseController, StartConversation, StartConversationError,
    StartConversationInput, SubmitHumanReply, SubmitHumanReplyError,
};
