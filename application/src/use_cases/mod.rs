//! Use cases: the operations external layers may invoke

pub mod advance;
pub mod start_conversation;
pub mod submit_human_reply;

#[cfg(test)]
pub(crate) mod testing;

pub use advance::{AdvanceError, AdvanceOutcome, PhaseController};
pub use start_conversation::{StartConversation, StartConversationError, StartConversationInput};
pub use submit_human_reply::{SubmitHumanReply, SubmitHumanReplyError};
