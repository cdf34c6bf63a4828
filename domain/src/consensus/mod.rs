//! Consensus engine: proposals, votes, ballots, and the weighted tally

pub mod ballot;
pub mod decision;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use ballot::BallotBox;
pub use decision::{compile_decision, FORCED_DECISION_MARKER};
pub use proposal::{Proposal, ProposalId};
pub use tally::{tally, ConsensusPolicy, TallyOutcome, TallyResult};
pub use vote::{Vote, VoteValue};
