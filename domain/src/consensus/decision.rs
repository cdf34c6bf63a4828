//! Final decision compilation

use super::proposal::Proposal;
use super::tally::TallyResult;
use crate::core::Goal;
use crate::participant::Roster;

/// Marker prepended to summaries produced by the forced-decision fallback;
/// must stay explicit and visible, never a silent default-approve
pub const FORCED_DECISION_MARKER: &str = "[forced decision]";

/// Compile the human-readable final decision text
///
/// Always non-empty: the goal, the accepted proposal, and the per-participant
/// voting record with rationales.
pub fn compile_decision(
    goal: &Goal,
    proposal: &Proposal,
    result: &TallyResult,
    roster: &Roster,
    forced: bool,
) -> String {
    let mut decision = String::new();
    if forced {
        decision.push_str(FORCED_DECISION_MARKER);
        decision.push_str(
            " Voting did not reach the consensus threshold; the facilitator cast the deciding synthesis.\n\n",
        );
    }
    decision.push_str(&format!("Goal: {}\n", goal));
    decision.push_str(&format!(
        "Decision: proposal raised in round {} was adopted ({} approve / {} reject / {} abstain of total weight {}).\n",
        proposal.round,
        result.approve_weight,
        result.reject_weight,
        result.abstain_weight,
        result.total_weight,
    ));
    decision.push_str(&format!("\n{}\n", proposal.description));

    decision.push_str("\nVoting record:\n");
    for vote in &result.votes {
        let name = roster
            .get(&vote.participant)
            .map(|p| p.name())
            .unwrap_or_else(|| vote.participant.as_str());
        decision.push_str(&format!("- {}: {}", name, vote.value));
        if let Some(rationale) = &vote.rationale {
            decision.push_str(&format!(" ({})", rationale));
        }
        decision.push('\n');
    }
    for member in roster.members() {
        if !result.votes.iter().any(|v| &v.participant == member.id()) {
            decision.push_str(&format!("- {}: no vote recorded\n", member.name()));
        }
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{tally, BallotBox, ConsensusPolicy, ProposalId, Vote};
    use crate::conversation::ConversationId;
    use crate::message::{MessageCategory, MessageDraft};
    use crate::participant::{Participant, Role, Roster};
    use crate::routing::MessageRouter;

    fn fixture() -> (Goal, Proposal, TallyResult, Roster) {
        let roster = Roster::new(vec![
            Participant::new("alex", "Alex", Role::Facilitator, "p"),
            Participant::new("sam", "Sam", Role::Architect, "p"),
            Participant::new("casey", "Casey", Role::Reviewer, "p"),
        ])
        .unwrap();

        let mut router = MessageRouter::new(ConversationId::new("c1"));
        let msg = router
            .append(MessageDraft::participant(
                "sam",
                MessageCategory::Proposal,
                "PROPOSAL: adopt Redis",
            ))
            .unwrap()
            .clone();
        let proposal = Proposal::from_message(&msg, "adopt Redis", 2);

        let mut ballots = BallotBox::new(ProposalId::new(msg.id.as_str()));
        ballots.collect(Vote::approve(ballots.proposal().clone(), "alex", "agreed"));
        ballots.collect(Vote::approve(ballots.proposal().clone(), "sam", "mine"));
        ballots.collect(Vote::reject(
            ballots.proposal().clone(),
            "casey",
            "durability concern",
        ));
        let result = tally(&ballots, &roster, &ConsensusPolicy::default());

        (Goal::new("Pick a cache"), proposal, result, roster)
    }

    #[test]
    fn test_decision_includes_votes_and_rationales() {
        let (goal, proposal, result, roster) = fixture();
        let text = compile_decision(&goal, &proposal, &result, &roster, false);

        assert!(text.contains("Pick a cache"));
        assert!(text.contains("adopt Redis"));
        assert!(text.contains("Alex: approve"));
        assert!(text.contains("Casey: reject (durability concern)"));
        assert!(!text.contains(FORCED_DECISION_MARKER));
    }

    #[test]
    fn test_forced_decision_is_flagged() {
        let (goal, proposal, result, roster) = fixture();
        let text = compile_decision(&goal, &proposal, &result, &roster, true);
        assert!(text.starts_with(FORCED_DECISION_MARKER));
    }

    #[test]
    fn test_non_voters_listed() {
        let (goal, proposal, mut result, roster) = fixture();
        result.votes.retain(|v| v.participant.as_str() != "casey");
        let text = compile_decision(&goal, &proposal, &result, &roster, false);
        assert!(text.contains("Casey: no vote recorded"));
    }
}
