//! Prompt templates for participant turns
//!
//! Each turn sends the participant's behavioral system prompt plus a phase
//! directive, and a user prompt carrying the goal, the transcript so far, and
//! the instruction for this turn. Directives demand machine-parsable markers
//! (see [`crate::prompt::parsing`]) so utterances can be classified without
//! a second model call.

use crate::context::{Assignment, ConversationContext};
use crate::conversation::Phase;
use crate::message::Message;

/// Marker a participant uses to put a proposal on the table
pub const PROPOSAL_MARKER: &str = "PROPOSAL:";
/// Marker a participant uses to cast a vote
pub const VOTE_MARKER: &str = "VOTE:";
/// Marker a participant uses to route a question to the human
pub const HUMAN_QUESTION_MARKER: &str = "QUESTION FOR USER:";

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt: participant persona plus the directive for this turn
    pub fn system_prompt(context: &ConversationContext<'_>) -> String {
        format!(
            "{}\n\n{}",
            context.participant.system_prompt(),
            Self::directive(context)
        )
    }

    /// User prompt: goal, transcript, and the turn instruction
    pub fn turn_prompt(context: &ConversationContext<'_>) -> String {
        let mut prompt = format!("Goal: {}\n", context.goal);
        if context.history.is_empty() {
            prompt.push_str("\nThe conversation has just started.\n");
        } else {
            prompt.push_str("\nTranscript so far:\n");
            prompt.push_str(&Self::transcript(context.history));
        }
        prompt.push('\n');
        prompt.push_str(Self::instruction(context));
        prompt
    }

    /// Render messages as `sender: content` lines in sequence order
    pub fn transcript(history: &[Message]) -> String {
        let mut out = String::new();
        for message in history {
            out.push_str(&format!("{}: {}\n", message.sender_id, message.content));
        }
        out
    }

    fn directive(context: &ConversationContext<'_>) -> &'static str {
        if let Assignment::Summarize { forced } = context.assignment {
            return if forced {
                "The team could not reach the consensus threshold. As facilitator you must \
                 now cast the deciding synthesis: weigh every position fairly, pick the \
                 strongest resolution of the goal, and state it as the final decision."
            } else {
                "The team has approved a proposal. Write the consensus summary: the decision, \
                 the reasoning that carried it, and any noted reservations."
            };
        }
        match context.phase {
            Phase::Exploring => {
                "The team is exploring the goal. Give your initial perspective in a few \
                 sentences. Only if the team truly cannot proceed without a piece of \
                 information, put a line starting with \"QUESTION FOR USER:\" in your reply."
            }
            Phase::Discussing => {
                "The team is discussing candidate solutions. React to the positions on the \
                 table and move the debate forward. To put a concrete proposal up for a \
                 vote, start a line with \"PROPOSAL:\" followed by the proposal itself."
            }
            Phase::Voting => {
                "A proposal is up for a vote. Your reply MUST begin with a line that is \
                 exactly \"VOTE: APPROVE\", \"VOTE: REJECT\", or \"VOTE: ABSTAIN\", followed \
                 by your rationale."
            }
            _ => "Contribute to the conversation.",
        }
    }

    fn instruction(context: &ConversationContext<'_>) -> &'static str {
        if matches!(context.assignment, Assignment::Summarize { .. }) {
            return "Write the final summary now.";
        }
        match context.phase {
            Phase::Exploring => "Give your initial take on the goal.",
            Phase::Discussing => "It is your turn in the discussion.",
            Phase::Voting => "Cast your vote now.",
            _ => "It is your turn.",
        }
    }
}
