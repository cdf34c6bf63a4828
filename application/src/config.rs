//! Per-conversation orchestration settings
//!
//! Supplied by the configuration collaborator at conversation-creation time
//! and treated as immutable for the conversation's lifetime.

use conclave_domain::ConsensusPolicy;
use serde::{Deserialize, Serialize};

/// Round, message, and retry budgets
///
/// Exceeding `max_rounds` or `max_total_messages` forces the conversation to
/// `aborted`; they are the only enforced upper bounds on autonomous
/// progress (a human-awaited pause has no timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    /// Completed round-robin cycles before the conversation aborts
    pub max_rounds: u32,
    /// Total messages before the conversation aborts
    pub max_total_messages: u64,
    /// Exploration cycles tolerated before moving on even if someone has not
    /// spoken (with the generation-failure placeholder this rarely fires)
    pub exploring_round_cap: u32,
    /// Discussion cycles that must elapse before a raised proposal goes to a
    /// vote
    pub min_discussion_rounds: u32,
    /// Discussion cycles without a new proposal or rebuttal before the
    /// stuck-conversation detector forces an early vote
    pub stall_rounds: u32,
    /// Failed generation attempts tolerated per turn before the placeholder
    /// message is recorded
    pub turn_retry_limit: u32,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            max_total_messages: 200,
            exploring_round_cap: 3,
            min_discussion_rounds: 1,
            stall_rounds: 2,
            turn_retry_limit: 2,
        }
    }
}

/// Everything the phase controller needs to run one conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    pub budgets: Budgets,
    pub consensus: ConsensusPolicy,
}
