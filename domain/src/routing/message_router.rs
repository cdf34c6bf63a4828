//! Message router: the single point where a message becomes official
//!
//! The router owns the threaded, append-only log of one conversation. It
//! validates drafts, assigns gap-free sequence numbers starting at 1, derives
//! the `requires_human_response` flag from the category, and answers history
//! queries. Threading is advisory for display; the router never reorders by
//! thread.

use crate::conversation::ConversationId;
use crate::message::{InvalidMessageError, Message, MessageCategory, MessageDraft};
use crate::message::entities::MessageId;
use crate::util::current_timestamp_ms;

/// Append-only log owner for one conversation
///
/// # Example
///
/// ```
/// use conclave_domain::conversation::ConversationId;
/// use conclave_domain::message::{MessageCategory, MessageDraft};
/// use conclave_domain::routing::MessageRouter;
///
/// let mut router = MessageRouter::new(ConversationId::new("c1"));
/// let msg = router
///     .append(MessageDraft::participant("alex", MessageCategory::Discussion, "Hello"))
///     .unwrap();
/// assert_eq!(msg.seq, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MessageRouter {
    conversation: ConversationId,
    log: Vec<Message>,
    /// Messages already persisted when the router was built; everything past
    /// this index was appended during the current step
    baseline: usize,
}

impl MessageRouter {
    /// Router over an empty log (new conversation)
    pub fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            log: Vec::new(),
            baseline: 0,
        }
    }

    /// Router over a persisted log
    ///
    /// Verifies the stored invariants (sequence gap-free from 1, every
    /// message tagged with this conversation) so a corrupt store surfaces
    /// immediately instead of as misscheduled turns.
    pub fn from_history(
        conversation: ConversationId,
        history: Vec<Message>,
    ) -> Result<Self, InvalidMessageError> {
        for (i, message) in history.iter().enumerate() {
            let expected = i as u64 + 1;
            if message.seq != expected {
                return Err(InvalidMessageError::OutOfSequence {
                    expected,
                    found: message.seq,
                });
            }
            if message.conversation != conversation {
                return Err(InvalidMessageError::WrongConversation {
                    id: message.id.clone(),
                    expected: conversation.to_string(),
                    found: message.conversation.to_string(),
                });
            }
        }
        let baseline = history.len();
        Ok(Self {
            conversation,
            log: history,
            baseline,
        })
    }

    /// Validate a draft and admit it to the log
    ///
    /// Fails with [`InvalidMessageError`] on empty trimmed content or a
    /// parent reference that does not name an earlier message of this
    /// conversation; a failed append leaves the log untouched.
    pub fn append(&mut self, draft: MessageDraft) -> Result<&Message, InvalidMessageError> {
        let content = draft.content.trim();
        if content.is_empty() {
            return Err(InvalidMessageError::EmptyContent);
        }
        if let Some(parent) = &draft.parent
            && !self.log.iter().any(|m| &m.id == parent)
        {
            // Covers dangling, forward, and cross-conversation references:
            // only already-appended messages of this log can match, and those
            // necessarily carry a smaller sequence number.
            return Err(InvalidMessageError::UnknownParent(parent.clone()));
        }

        let seq = self.next_seq();
        let message = Message {
            id: MessageId::for_seq(&self.conversation, seq),
            conversation: self.conversation.clone(),
            sender_kind: draft.sender_kind,
            sender_id: draft.sender_id,
            category: draft.category,
            content: content.to_string(),
            parent: draft.parent,
            requires_human_response: draft.category.requires_human_response(),
            seq,
            timestamp_ms: current_timestamp_ms(),
        };
        self.log.push(message);
        Ok(&self.log[self.log.len() - 1])
    }

    /// The full log in sequence order
    pub fn history(&self) -> &[Message] {
        &self.log
    }

    /// The log truncated to messages with `seq <= up_to`; reflects only prior
    /// appends, never look-ahead
    pub fn history_up_to(&self, up_to: u64) -> &[Message] {
        let end = self.log.iter().take_while(|m| m.seq <= up_to).count();
        &self.log[..end]
    }

    /// The latest unanswered `question_to_human`, if any
    pub fn pending_human_question(&self) -> Option<&Message> {
        for message in self.log.iter().rev() {
            match message.category {
                MessageCategory::HumanReply => return None,
                MessageCategory::QuestionToHuman => return Some(message),
                _ => {}
            }
        }
        None
    }

    /// Messages appended since the router was built from storage
    pub fn appended(&self) -> &[Message] {
        &self.log[self.baseline..]
    }

    pub fn last(&self) -> Option<&Message> {
        self.log.last()
    }

    /// Sequence number of the most recent message (0 for an empty log)
    pub fn last_seq(&self) -> u64 {
        self.log.last().map(|m| m.seq).unwrap_or(0)
    }

    /// Sequence number the next append will receive
    pub fn next_seq(&self) -> u64 {
        self.last_seq() + 1
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SenderKind;

    fn router() -> MessageRouter {
        MessageRouter::new(ConversationId::new("c1"))
    }

    fn discussion(sender: &str, content: &str) -> MessageDraft {
        MessageDraft::participant(sender, MessageCategory::Discussion, content)
    }

    #[test]
    fn test_sequence_numbers_gap_free_from_one() {
        let mut r = router();
        for i in 0..5 {
            let msg = r.append(discussion("alex", &format!("message {}", i))).unwrap();
            assert_eq!(msg.seq, i + 1);
        }
        let seqs: Vec<u64> = r.history().iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_content_rejected_without_side_effects() {
        let mut r = router();
        assert_eq!(
            r.append(discussion("alex", "   \n\t ")),
            Err(InvalidMessageError::EmptyContent)
        );
        assert!(r.is_empty());
    }

    #[test]
    fn test_content_stored_trimmed() {
        let mut r = router();
        let msg = r.append(discussion("alex", "  hello  \n")).unwrap();
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_parent_must_exist() {
        let mut r = router();
        let draft = discussion("alex", "reply").with_parent(MessageId::new("c1/9"));
        assert!(matches!(
            r.append(draft),
            Err(InvalidMessageError::UnknownParent(_))
        ));
        assert!(r.is_empty());
    }

    #[test]
    fn test_parent_precedes_child() {
        let mut r = router();
        let first = r.append(discussion("alex", "first")).unwrap().id.clone();
        let child = r
            .append(discussion("sam", "second").with_parent(first.clone()))
            .unwrap();
        assert_eq!(child.parent, Some(first.clone()));

        let parent_seq = r
            .history()
            .iter()
            .find(|m| m.id == first)
            .map(|m| m.seq)
            .unwrap();
        let child_seq = r.history().last().unwrap().seq;
        assert!(parent_seq < child_seq);
    }

    #[test]
    fn test_cross_conversation_parent_rejected() {
        let mut other = MessageRouter::new(ConversationId::new("c2"));
        let foreign = other.append(discussion("alex", "elsewhere")).unwrap().id.clone();

        let mut r = router();
        r.append(discussion("alex", "here")).unwrap();
        assert!(matches!(
            r.append(discussion("sam", "reply").with_parent(foreign)),
            Err(InvalidMessageError::UnknownParent(_))
        ));
    }

    #[test]
    fn test_requires_human_response_derived_from_category() {
        let mut r = router();
        let q = r
            .append(MessageDraft::participant(
                "alex",
                MessageCategory::QuestionToHuman,
                "What is the budget?",
            ))
            .unwrap();
        assert!(q.requires_human_response);

        let d = r.append(discussion("sam", "while we wait")).unwrap();
        assert!(!d.requires_human_response);
    }

    #[test]
    fn test_pending_human_question() {
        let mut r = router();
        assert!(r.pending_human_question().is_none());

        r.append(discussion("alex", "intro")).unwrap();
        let question = r
            .append(MessageDraft::participant(
                "alex",
                MessageCategory::QuestionToHuman,
                "What is the budget?",
            ))
            .unwrap()
            .id
            .clone();
        assert_eq!(r.pending_human_question().map(|m| m.id.clone()), Some(question.clone()));

        r.append(MessageDraft::human_reply("About 10k").with_parent(question))
            .unwrap();
        assert!(r.pending_human_question().is_none());
    }

    #[test]
    fn test_history_up_to_excludes_later_messages() {
        let mut r = router();
        r.append(discussion("alex", "one")).unwrap();
        r.append(discussion("sam", "two")).unwrap();
        r.append(discussion("jordan", "three")).unwrap();
        let view = r.history_up_to(2);
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|m| m.seq <= 2));
    }

    #[test]
    fn test_from_history_roundtrip() {
        let mut r = router();
        r.append(discussion("alex", "one")).unwrap();
        r.append(discussion("sam", "two")).unwrap();
        let stored = r.history().to_vec();

        let mut resumed = MessageRouter::from_history(ConversationId::new("c1"), stored).unwrap();
        assert_eq!(resumed.len(), 2);
        assert!(resumed.appended().is_empty());

        resumed.append(discussion("jordan", "three")).unwrap();
        assert_eq!(resumed.appended().len(), 1);
        assert_eq!(resumed.appended()[0].seq, 3);
    }

    #[test]
    fn test_from_history_rejects_gaps() {
        let mut r = router();
        r.append(discussion("alex", "one")).unwrap();
        r.append(discussion("sam", "two")).unwrap();
        let mut stored = r.history().to_vec();
        stored.remove(0);

        assert_eq!(
            MessageRouter::from_history(ConversationId::new("c1"), stored).unwrap_err(),
            InvalidMessageError::OutOfSequence {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_from_history_rejects_wrong_conversation() {
        let mut r = router();
        r.append(discussion("alex", "one")).unwrap();
        let stored = r.history().to_vec();

        assert!(matches!(
            MessageRouter::from_history(ConversationId::new("c2"), stored),
            Err(InvalidMessageError::WrongConversation { .. })
        ));
    }

    #[test]
    fn test_human_reply_sender_kind() {
        let mut r = router();
        let msg = r.append(MessageDraft::human_reply("my answer")).unwrap();
        assert_eq!(msg.sender_kind, SenderKind::Human);
        assert_eq!(msg.sender_id, "human");
    }
}
