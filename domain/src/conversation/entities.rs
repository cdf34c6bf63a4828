//! Conversation aggregate
//!
//! One orchestration session. Owned exclusively by the phase controller while
//! active; persisted by an external store between `advance()` calls, so every
//! field the controller needs to resume (phase, counters, phase-start
//! sequence) lives here rather than in process memory.

use super::phase::Phase;
use crate::core::goal::Goal;
use crate::util::current_timestamp_ms;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversation identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        ConversationId::new(s)
    }
}

/// Lifecycle status of a conversation
///
/// Orthogonal to [`Phase`]: `AwaitingHuman` pauses whichever phase is
/// current, and the conversation resumes in that same phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    AwaitingHuman,
    Completed,
    Aborted,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::AwaitingHuman => "awaiting_human",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Aborted => "aborted",
        }
    }

    /// Terminal statuses admit no further steps
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Completed | ConversationStatus::Aborted
        )
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted phase transition outside the state machine edges
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid phase transition: {from} -> {to}")]
pub struct PhaseTransitionError {
    pub from: Phase,
    pub to: Phase,
}

/// One orchestration session (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    goal: Goal,
    phase: Phase,
    status: ConversationStatus,
    /// Completed round-robin cycles across all phases
    round: u32,
    /// Voting rounds that ended without quorum
    voting_rounds: u32,
    /// Consecutive generation failures for the current turn
    turn_failures: u32,
    /// Sequence number of the last message before the current phase began;
    /// messages belonging to the phase have strictly larger sequence numbers
    phase_started_seq: u64,
    created_at_ms: u64,
    updated_at_ms: u64,
    final_summary: Option<String>,
}

impl Conversation {
    pub fn new(id: impl Into<ConversationId>, goal: Goal) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: id.into(),
            goal,
            phase: Phase::Initializing,
            status: ConversationStatus::Active,
            round: 0,
            voting_rounds: 0,
            turn_failures: 0,
            phase_started_seq: 0,
            created_at_ms: now,
            updated_at_ms: now,
            final_summary: None,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn voting_rounds(&self) -> u32 {
        self.voting_rounds
    }

    pub fn turn_failures(&self) -> u32 {
        self.turn_failures
    }

    pub fn phase_started_seq(&self) -> u64 {
        self.phase_started_seq
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn updated_at_ms(&self) -> u64 {
        self.updated_at_ms
    }

    pub fn final_summary(&self) -> Option<&str> {
        self.final_summary.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to the next phase, recording where in the log the phase begins
    pub fn transition_to(
        &mut self,
        phase: Phase,
        last_seq: u64,
    ) -> Result<(), PhaseTransitionError> {
        if !self.phase.can_transition_to(phase) {
            return Err(PhaseTransitionError {
                from: self.phase,
                to: phase,
            });
        }
        self.phase = phase;
        self.phase_started_seq = last_seq;
        self.touch();
        Ok(())
    }

    /// Restart the current phase segment (e.g., a re-vote after `no_quorum`):
    /// earlier messages stop counting as turns of the phase
    pub fn restart_phase(&mut self, last_seq: u64) {
        self.phase_started_seq = last_seq;
        self.touch();
    }

    /// Park the conversation until a human reply arrives
    pub fn await_human(&mut self) {
        if self.status == ConversationStatus::Active {
            self.status = ConversationStatus::AwaitingHuman;
            self.touch();
        }
    }

    /// Release an `AwaitingHuman` pause; no-op in any other status
    pub fn resume(&mut self) {
        if self.status == ConversationStatus::AwaitingHuman {
            self.status = ConversationStatus::Active;
            self.touch();
        }
    }

    /// Terminate with a decision summary
    pub fn complete(&mut self, summary: impl Into<String>) {
        self.phase = Phase::Completed;
        self.status = ConversationStatus::Completed;
        self.final_summary = Some(summary.into());
        self.touch();
    }

    /// Terminate without a decision; the reason is always recorded
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.status = ConversationStatus::Aborted;
        self.final_summary = Some(reason.into());
        self.touch();
    }

    /// Record a completed round-robin cycle
    pub fn bump_round(&mut self) {
        self.round += 1;
        self.touch();
    }

    /// Record a voting round that ended without quorum
    pub fn bump_voting_round(&mut self) {
        self.voting_rounds += 1;
        self.touch();
    }

    /// Record one failed generation attempt for the current turn; returns the
    /// new consecutive-failure count
    pub fn record_turn_failure(&mut self) -> u32 {
        self.turn_failures += 1;
        self.touch();
        self.turn_failures
    }

    pub fn reset_turn_failures(&mut self) {
        if self.turn_failures != 0 {
            self.turn_failures = 0;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at_ms = current_timestamp_ms();
    }
}
