//! Conversation phase state machine
//!
//! `INITIALIZING → EXPLORING → DISCUSSING → VOTING → {DISCUSSING | COMPLETED}`.
//! The `AWAITING_HUMAN` pause and the `ABORTED` terminal are conversation
//! *statuses*, orthogonal to the phase, so they do not appear here.

use serde::{Deserialize, Serialize};

/// Phase of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Bookkeeping phase before the first participant turn
    Initializing,
    /// Every participant states an initial position on the goal
    Exploring,
    /// Participants debate and raise proposals
    Discussing,
    /// Participants cast votes on the active proposal
    Voting,
    /// A decision was reached; no further turns are scheduled
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Exploring => "exploring",
            Phase::Discussing => "discussing",
            Phase::Voting => "voting",
            Phase::Completed => "completed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Initializing => "Initializing",
            Phase::Exploring => "Exploration",
            Phase::Discussing => "Discussion",
            Phase::Voting => "Voting",
            Phase::Completed => "Completed",
        }
    }

    /// Whether participants take speaking turns in this phase
    pub fn is_speaking(&self) -> bool {
        matches!(self, Phase::Exploring | Phase::Discussing | Phase::Voting)
    }

    /// Whether this phase has a successor
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }

    /// Check a transition against the state machine edges
    ///
    /// `Voting → Discussing` is the retry edge taken after a decisive
    /// rejection.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Initializing, Phase::Exploring)
                | (Phase::Exploring, Phase::Discussing)
                | (Phase::Discussing, Phase::Voting)
                | (Phase::Voting, Phase::Discussing)
                | (Phase::Voting, Phase::Completed)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
