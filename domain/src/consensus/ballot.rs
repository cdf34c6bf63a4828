//! Ballot collection for one proposal

use super::proposal::ProposalId;
use super::vote::Vote;
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Collected votes for a single proposal
///
/// Collection is an idempotent upsert per (participant, proposal): a
/// resubmitted vote replaces the earlier one, so participants can change
/// position during discussion right up to the tally. There is deliberately
/// no duplicate-vote error.
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::{BallotBox, ProposalId, Vote, VoteValue};
///
/// let proposal = ProposalId::new("c1/7");
/// let mut ballots = BallotBox::new(proposal.clone());
/// ballots.collect(Vote::reject(proposal.clone(), "sam", "Too risky"));
/// ballots.collect(Vote::approve(proposal, "sam", "Convinced after discussion"));
///
/// assert_eq!(ballots.vote_count(), 1);
/// assert_eq!(ballots.votes()[0].value, VoteValue::Approve);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotBox {
    proposal: ProposalId,
    votes: Vec<Vote>,
}

impl BallotBox {
    pub fn new(proposal: ProposalId) -> Self {
        Self {
            proposal,
            votes: Vec::new(),
        }
    }

    pub fn proposal(&self) -> &ProposalId {
        &self.proposal
    }

    /// Upsert a vote; votes for other proposals are ignored
    pub fn collect(&mut self, vote: Vote) {
        if vote.proposal != self.proposal {
            return;
        }
        if let Some(existing) = self
            .votes
            .iter_mut()
            .find(|v| v.participant == vote.participant)
        {
            *existing = vote;
        } else {
            self.votes.push(vote);
        }
    }

    /// Votes in first-cast order (latest value per participant)
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn vote_of(&self, participant: &ParticipantId) -> Option<&Vote> {
        self.votes.iter().find(|v| &v.participant == participant)
    }

    pub fn has_voted(&self, participant: &ParticipantId) -> bool {
        self.vote_of(participant).is_some()
    }
}
