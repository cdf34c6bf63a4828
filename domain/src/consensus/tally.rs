//! Weighted consensus tally
//!
//! The tally weighs approve and reject votes against the total eligible
//! participant weight, not against the votes cast: abstentions (and missing
//! votes) lower the achievable ratios, modeling real attrition rather than
//! being ignored.

use super::ballot::BallotBox;
use super::vote::{Vote, VoteValue};
use crate::participant::Roster;
use serde::{Deserialize, Serialize};

/// Policy knobs for consensus evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusPolicy {
    /// Weighted-approval fraction required to accept a proposal
    pub threshold: f64,
    /// Voting rounds without quorum tolerated before the fallback fires
    pub max_voting_rounds: u32,
    /// Whether the facilitator may cast a forced decision after retries are
    /// exhausted; when false, exhaustion aborts the conversation instead
    pub enable_forced_decision: bool,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            max_voting_rounds: 3,
            enable_forced_decision: true,
        }
    }
}

impl ConsensusPolicy {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.5, 1.0);
        self
    }
}

/// Outcome of a consensus tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyOutcome {
    Approved,
    Rejected,
    NoQuorum,
}

impl TallyOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, TallyOutcome::Approved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TallyOutcome::Rejected)
    }

    /// Decisive outcomes end the voting phase; `no_quorum` does not
    pub fn is_decisive(&self) -> bool {
        !matches!(self, TallyOutcome::NoQuorum)
    }
}

impl std::fmt::Display for TallyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TallyOutcome::Approved => "approved",
            TallyOutcome::Rejected => "rejected",
            TallyOutcome::NoQuorum => "no_quorum",
        };
        write!(f, "{}", s)
    }
}

/// Aggregated result of one tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyResult {
    pub outcome: TallyOutcome,
    pub approve_weight: u32,
    pub reject_weight: u32,
    pub abstain_weight: u32,
    /// Total eligible weight over the roster, including non-voters
    pub total_weight: u32,
    pub votes: Vec<Vote>,
}

impl TallyResult {
    pub fn approve_ratio(&self) -> f64 {
        if self.total_weight == 0 {
            0.0
        } else {
            f64::from(self.approve_weight) / f64::from(self.total_weight)
        }
    }

    pub fn reject_ratio(&self) -> f64 {
        if self.total_weight == 0 {
            0.0
        } else {
            f64::from(self.reject_weight) / f64::from(self.total_weight)
        }
    }
}

/// Evaluate collected ballots against the policy
///
/// `approved` when the weighted approve ratio meets or exceeds the threshold.
/// `rejected` when the weighted reject ratio strictly exceeds `1 - threshold`
/// AND rejection outweighs approval: balanced opposition stays `no_quorum` so
/// the discussion can continue instead of killing a proposal half the room
/// supports. `no_quorum` otherwise. Votes from participants outside the
/// roster carry no weight.
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::{tally, BallotBox, ConsensusPolicy, ProposalId, TallyOutcome, Vote};
/// use conclave_domain::participant::{Participant, Role, Roster};
///
/// let roster = Roster::new(vec![
///     Participant::new("a", "A", Role::Facilitator, "p"),
///     Participant::new("b", "B", Role::Strategist, "p"),
///     Participant::new("c", "C", Role::Reviewer, "p"),
/// ])
/// .unwrap();
///
/// let proposal = ProposalId::new("c1/7");
/// let mut ballots = BallotBox::new(proposal.clone());
/// ballots.collect(Vote::approve(proposal.clone(), "a", "yes"));
/// ballots.collect(Vote::reject(proposal.clone(), "b", "no"));
/// ballots.collect(Vote::abstain(proposal, "c"));
///
/// let result = tally(&ballots, &roster, &ConsensusPolicy::default());
/// assert_eq!(result.outcome, TallyOutcome::NoQuorum); // 1/3 < 0.8
/// ```
pub fn tally(ballots: &BallotBox, roster: &Roster, policy: &ConsensusPolicy) -> TallyResult {
    let mut approve_weight = 0u32;
    let mut reject_weight = 0u32;
    let mut abstain_weight = 0u32;

    for vote in ballots.votes() {
        let Some(member) = roster.get(&vote.participant) else {
            continue;
        };
        match vote.value {
            VoteValue::Approve => approve_weight += member.weight(),
            VoteValue::Reject => reject_weight += member.weight(),
            VoteValue::Abstain => abstain_weight += member.weight(),
        }
    }

    let total_weight = roster.total_weight();
    let total = f64::from(total_weight);

    let outcome = if total_weight == 0 {
        TallyOutcome::NoQuorum
    } else if f64::from(approve_weight) / total >= policy.threshold {
        TallyOutcome::Approved
    } else if f64::from(reject_weight) / total > 1.0 - policy.threshold
        && reject_weight > approve_weight
    {
        TallyOutcome::Rejected
    } else {
        TallyOutcome::NoQuorum
    };

    TallyResult {
        outcome,
        approve_weight,
        reject_weight,
        abstain_weight,
        total_weight,
        votes: ballots.votes().to_vec(),
    }
}
