//! Append-only message log entities

pub mod entities;
pub mod error;

pub use entities::{Message, MessageCategory, MessageDraft, MessageId, SenderKind};
pub use error::InvalidMessageError;
