//! Message entities
//!
//! Messages are the atomic units of the append-only conversation log. Once
//! written they are never mutated or deleted.

use crate::conversation::ConversationId;
use serde::{Deserialize, Serialize};

/// Message identifier (Value Object)
///
/// Derived from the conversation id and the sequence number, so ids are
/// stable across process restarts without a separate id generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical id for the message at `seq` in `conversation`
    pub fn for_seq(conversation: &ConversationId, seq: u64) -> Self {
        Self(format!("{}/{}", conversation, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    Participant,
    Human,
}

/// What kind of contribution a message is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Discussion,
    QuestionToHuman,
    HumanReply,
    Proposal,
    Vote,
    ConsensusSummary,
}

impl MessageCategory {
    pub fn as_str(&self) -> &str {
        match self {
            MessageCategory::Discussion => "discussion",
            MessageCategory::QuestionToHuman => "question_to_human",
            MessageCategory::HumanReply => "human_reply",
            MessageCategory::Proposal => "proposal",
            MessageCategory::Vote => "vote",
            MessageCategory::ConsensusSummary => "consensus_summary",
        }
    }

    /// Whether messages of this category pause the conversation for a human
    /// reply; the router derives the flag from here, never from the draft
    pub fn requires_human_response(&self) -> bool {
        matches!(self, MessageCategory::QuestionToHuman)
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message not yet admitted to the log
///
/// Drafts carry everything the sender decides; the router supplies the
/// identifier, sequence number, timestamp, and derived flags at append time.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender_kind: SenderKind,
    pub sender_id: String,
    pub category: MessageCategory,
    pub content: String,
    pub parent: Option<MessageId>,
}

impl MessageDraft {
    /// Draft authored by a participant
    pub fn participant(
        sender_id: impl Into<String>,
        category: MessageCategory,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender_kind: SenderKind::Participant,
            sender_id: sender_id.into(),
            category,
            content: content.into(),
            parent: None,
        }
    }

    /// Draft carrying a human reply
    pub fn human_reply(content: impl Into<String>) -> Self {
        Self {
            sender_kind: SenderKind::Human,
            sender_id: "human".to_string(),
            category: MessageCategory::HumanReply,
            content: content.into(),
            parent: None,
        }
    }

    /// Thread the draft under an earlier message
    pub fn with_parent(mut self, parent: MessageId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A message admitted to the log (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation: ConversationId,
    pub sender_kind: SenderKind,
    pub sender_id: String,
    pub category: MessageCategory,
    pub content: String,
    pub parent: Option<MessageId>,
    pub requires_human_response: bool,
    /// Monotonic within the conversation, gap-free from 1
    pub seq: u64,
    pub timestamp_ms: u64,
}

impl Message {
    pub fn is_from_participant(&self) -> bool {
        self.sender_kind == SenderKind::Participant
    }

    pub fn is_from_human(&self) -> bool {
        self.sender_kind == SenderKind::Human
    }
}
