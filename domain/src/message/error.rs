//! Message validation errors

use super::entities::MessageId;
use thiserror::Error;

/// Rejected append or corrupt log
///
/// These surface integration bugs and are never swallowed: a failed append
/// has no side effects on the log.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidMessageError {
    #[error("Message content is empty after trimming")]
    EmptyContent,

    #[error("Parent message {0} does not precede the new message in this conversation")]
    UnknownParent(MessageId),

    #[error("Message log is out of sequence: expected seq {expected}, found {found}")]
    OutOfSequence { expected: u64, found: u64 },

    #[error("Message {id} belongs to conversation {found}, not {expected}")]
    WrongConversation {
        id: MessageId,
        expected: String,
        found: String,
    },
}
