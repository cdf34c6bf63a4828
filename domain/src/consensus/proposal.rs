//! Proposal entity

use crate::message::{Message, MessageId};
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Proposal identifier (Value Object)
///
/// Derived from the originating message id: the message log stays the single
/// source of truth and proposals need no separate persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate solution surfaced during discussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// The `proposal`-category message that introduced it
    pub message: MessageId,
    pub proposed_by: ParticipantId,
    pub description: String,
    /// Round in which the proposal was raised
    pub round: u32,
}

impl Proposal {
    /// Build a proposal from its originating message
    pub fn from_message(message: &Message, description: impl Into<String>, round: u32) -> Self {
        Self {
            id: ProposalId::new(message.id.as_str()),
            message: message.id.clone(),
            proposed_by: ParticipantId::new(message.sender_id.clone()),
            description: description.into(),
            round,
        }
    }
}
