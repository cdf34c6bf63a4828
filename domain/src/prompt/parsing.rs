//! Utterance classification and vote extraction
//!
//! These functions turn free-form generated text into structured message
//! categories and votes. They are pure domain logic — no I/O, no session
//! state, just text pattern matching. Conservative on ambiguity: an
//! unparsable vote becomes an abstention, unmarked text stays discussion.

use super::template::{HUMAN_QUESTION_MARKER, PROPOSAL_MARKER, VOTE_MARKER};
use crate::consensus::VoteValue;
use crate::conversation::Phase;
use crate::message::MessageCategory;

/// Classify an utterance generated for the given phase
///
/// Voting turns always classify as `vote` (the directive demands it, and the
/// tally treats unparsable votes as abstentions). Elsewhere, explicit markers
/// win; proposals are only recognized during discussion, where they are
/// actionable.
pub fn classify_utterance(phase: Phase, text: &str) -> MessageCategory {
    if phase == Phase::Voting {
        return MessageCategory::Vote;
    }
    if extract_human_question(text).is_some() {
        return MessageCategory::QuestionToHuman;
    }
    if phase == Phase::Discussing && extract_proposal(text).is_some() {
        return MessageCategory::Proposal;
    }
    MessageCategory::Discussion
}

/// Extract the proposal description from a `PROPOSAL:`-marked utterance
///
/// The description runs from the marker to the end of the text, so
/// multi-line proposals survive intact.
pub fn extract_proposal(text: &str) -> Option<String> {
    extract_after_marker(text, PROPOSAL_MARKER)
}

/// Extract the question from a `QUESTION FOR USER:`-marked utterance
pub fn extract_human_question(text: &str) -> Option<String> {
    extract_after_marker(text, HUMAN_QUESTION_MARKER)
}

fn extract_after_marker(text: &str, marker: &str) -> Option<String> {
    for (i, line) in text.lines().enumerate() {
        if let Some(rest) = line.trim_start().strip_prefix(marker) {
            let mut description = rest.trim().to_string();
            for later in text.lines().skip(i + 1) {
                description.push('\n');
                description.push_str(later);
            }
            let description = description.trim().to_string();
            if description.is_empty() {
                return None;
            }
            return Some(description);
        }
    }
    None
}

/// Parse a voting utterance into a vote value and rationale
///
/// # Supported formats
///
/// 1. **Marker line** (what the directive asks for): `VOTE: APPROVE` as the
///    first matching line; the rest of the text is the rationale.
/// 2. **JSON**: `{"vote": "approve", "rationale": "..."}` anywhere in the
///    text.
/// 3. **Keywords**: `APPROVE`/`REJECT` scanning with negation guards.
///
/// Falls back to an abstention with the full text as rationale, so a
/// confused participant weakens quorum instead of silently approving.
pub fn parse_vote(text: &str) -> (VoteValue, Option<String>) {
    // 1. Marker line
    for line in text.lines() {
        if let Some(rest) = line.trim_start().strip_prefix(VOTE_MARKER) {
            if let Ok(value) = rest.trim().split_whitespace().next().unwrap_or("").parse() {
                let rationale: String = text
                    .lines()
                    .filter(|l| l.trim_start().strip_prefix(VOTE_MARKER).is_none())
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string();
                let rationale = if rationale.is_empty() {
                    None
                } else {
                    Some(rationale)
                };
                return (value, rationale);
            }
            break;
        }
    }

    // 2. Embedded JSON
    if let Some(start) = text.find('{')
        && let Some(end) = text[start..].rfind('}')
    {
        let json_str = &text[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(value) = parsed
                .get("vote")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<VoteValue>().ok())
        {
            let rationale = parsed
                .get("rationale")
                .and_then(|r| r.as_str())
                .map(|s| s.to_string());
            return (value, rationale);
        }
    }

    // 3. Keyword scan
    let upper = text.to_uppercase();
    let approves = upper.contains("APPROVE")
        && !upper.contains("NOT APPROVE")
        && !upper.contains("DON'T APPROVE")
        && !upper.contains("CANNOT APPROVE");
    let rejects = upper.contains("REJECT");
    let abstains = upper.contains("ABSTAIN");

    let value = if abstains {
        VoteValue::Abstain
    } else if approves && !rejects {
        VoteValue::Approve
    } else if rejects && !approves {
        VoteValue::Reject
    } else {
        VoteValue::Abstain
    };

    let rationale = if text.trim().is_empty() {
        None
    } else {
        Some(text.trim().to_string())
    };
    (value, rationale)
}
