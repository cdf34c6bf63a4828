//! Prompt templates and utterance parsing

pub mod parsing;
pub mod template;

pub use parsing::{classify_utterance, extract_human_question, extract_proposal, parse_vote};
pub use template::{PromptTemplate, HUMAN_QUESTION_MARKER, PROPOSAL_MARKER, VOTE_MARKER};
