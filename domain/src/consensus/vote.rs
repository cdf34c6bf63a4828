//! Vote types for consensus building

use super::proposal::ProposalId;
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// A participant's ternary judgment on a proposal
///
/// Abstentions are first-class: they count toward the total weight at tally
/// time but toward neither side, lowering the achievable approval ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Approve,
    Reject,
    Abstain,
}

impl VoteValue {
    pub fn as_str(&self) -> &str {
        match self {
            VoteValue::Approve => "approve",
            VoteValue::Reject => "reject",
            VoteValue::Abstain => "abstain",
        }
    }
}

impl std::fmt::Display for VoteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VoteValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "approved" | "yes" => Ok(VoteValue::Approve),
            "reject" | "rejected" | "no" => Ok(VoteValue::Reject),
            "abstain" | "abstained" => Ok(VoteValue::Abstain),
            _ => Err(format!("Unknown vote value: {}", s)),
        }
    }
}

/// A single vote on a proposal
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::{ProposalId, Vote};
///
/// let vote = Vote::approve(ProposalId::new("c1/7"), "sam", "The plan is sound.");
/// assert_eq!(vote.value, conclave_domain::consensus::VoteValue::Approve);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal: ProposalId,
    pub participant: ParticipantId,
    pub value: VoteValue,
    pub rationale: Option<String>,
}

impl Vote {
    pub fn new(
        proposal: ProposalId,
        participant: impl Into<ParticipantId>,
        value: VoteValue,
    ) -> Self {
        Self {
            proposal,
            participant: participant.into(),
            value,
            rationale: None,
        }
    }

    pub fn approve(
        proposal: ProposalId,
        participant: impl Into<ParticipantId>,
        rationale: impl Into<String>,
    ) -> Self {
        Self::new(proposal, participant, VoteValue::Approve).with_rationale(rationale)
    }

    pub fn reject(
        proposal: ProposalId,
        participant: impl Into<ParticipantId>,
        rationale: impl Into<String>,
    ) -> Self {
        Self::new(proposal, participant, VoteValue::Reject).with_rationale(rationale)
    }

    pub fn abstain(proposal: ProposalId, participant: impl Into<ParticipantId>) -> Self {
        Self::new(proposal, participant, VoteValue::Abstain)
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        let rationale = rationale.into();
        self.rationale = if rationale.trim().is_empty() {
            None
        } else {
            Some(rationale)
        };
        self
    }
}
