//! Conversation context: the read view handed to generation
//!
//! Assembled fresh before every generation call from the goal, the acting
//! participant's descriptor, and the ordered slice of prior messages. Never
//! mutated in place and never persisted.

use crate::conversation::Phase;
use crate::core::Goal;
use crate::message::Message;
use crate::participant::Participant;

/// What the acting participant is being asked to do this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Take a normal speaking turn for the current phase
    Speak,
    /// Synthesize the consensus summary that closes the conversation
    Summarize {
        /// True when voting retries were exhausted and the facilitator is
        /// casting the forced decision
        forced: bool,
    },
}

/// Read view over one conversation for a single generation call
#[derive(Debug, Clone)]
pub struct ConversationContext<'a> {
    pub goal: &'a Goal,
    pub phase: Phase,
    pub participant: &'a Participant,
    /// Prior messages in sequence order; reflects only messages appended
    /// before this turn
    pub history: &'a [Message],
    pub assignment: Assignment,
}

impl<'a> ConversationContext<'a> {
    /// Context for a normal speaking turn
    pub fn speaking(
        goal: &'a Goal,
        phase: Phase,
        participant: &'a Participant,
        history: &'a [Message],
    ) -> Self {
        Self {
            goal,
            phase,
            participant,
            history,
            assignment: Assignment::Speak,
        }
    }

    /// Context for the closing synthesis turn
    pub fn summarizing(
        goal: &'a Goal,
        phase: Phase,
        participant: &'a Participant,
        history: &'a [Message],
        forced: bool,
    ) -> Self {
        Self {
            goal,
            phase,
            participant,
            history,
            assignment: Assignment::Summarize { forced },
        }
    }
}
