//! Transport/notification collaborator port
//!
//! After each successful step the controller emits one event per change.
//! Delivery and fan-out to connected clients is entirely the collaborator's
//! responsibility; `emit` is synchronous and non-fallible so a broken sink
//! can never disrupt orchestration.

use conclave_domain::{ConversationId, ConversationStatus, Message, Phase};
use serde::Serialize;

/// One observable change produced by a step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    MessageAppended {
        conversation: ConversationId,
        message: Message,
    },
    PhaseChanged {
        conversation: ConversationId,
        phase: Phase,
    },
    StatusChanged {
        conversation: ConversationId,
        status: ConversationStatus,
    },
}

impl StepEvent {
    /// Event type identifier, stable for wire formats and logs
    pub fn kind(&self) -> &'static str {
        match self {
            StepEvent::MessageAppended { .. } => "message_appended",
            StepEvent::PhaseChanged { .. } => "phase_changed",
            StepEvent::StatusChanged { .. } => "status_changed",
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        match self {
            StepEvent::MessageAppended { conversation, .. }
            | StepEvent::PhaseChanged { conversation, .. }
            | StepEvent::StatusChanged { conversation, .. } => conversation,
        }
    }
}

/// Port for publishing step events
pub trait EventSink: Send + Sync {
    /// Publish one event; failures are the sink's problem, not the core's
    fn emit(&self, event: StepEvent);
}

/// No-op implementation for tests and when notification is disabled
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn emit(&self, _event: StepEvent) {}
}
