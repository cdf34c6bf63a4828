//! Turn scheduler
//!
//! Decides which actor speaks next, given the conversation phase and the
//! message log. Pure and deterministic: the same roster, phase, and log
//! always yield the same actor, across repeated calls and across process
//! restarts — this is what makes mid-conversation resumption possible.

use crate::conversation::{Conversation, Phase};
use crate::message::Message;
use crate::participant::{Participant, ParticipantId, Roster};
use crate::routing::MessageRouter;

/// The next unit of scheduler-assigned activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A participant should generate an utterance
    Participant(ParticipantId),
    /// The conversation must wait for human input
    Human,
}

/// Pick the next actor
///
/// Rules, in precedence order:
/// 1. An unanswered `question_to_human` always yields [`Actor::Human`] —
///    pending human questions are resolved before anything else (including
///    stuck-detection in the controller) may force progress.
/// 2. Otherwise round-robin over the roster in an order fixed per phase:
///    the facilitator opens exploration; the strategist opens the first
///    discussion cycle; every later discussion cycle starts with the
///    facilitator as the tie-breaking "nudge" speaker; voting runs
///    facilitator-last so the closing turn is theirs.
///
/// Only participant messages after the phase start consume turns; human
/// replies never shift the rotation.
pub fn next_actor(conversation: &Conversation, roster: &Roster, log: &MessageRouter) -> Actor {
    if log.pending_human_question().is_some() {
        return Actor::Human;
    }

    let taken = phase_turns(conversation, log);
    let len = roster.len();
    let cycle = taken / len;
    let slot = taken % len;

    let order = match conversation.phase() {
        Phase::Exploring => leader_rotation(roster, roster.facilitator()),
        Phase::Discussing => {
            if cycle == 0 {
                let opener = roster
                    .members()
                    .iter()
                    .find(|m| m.role().opens(Phase::Discussing))
                    .unwrap_or_else(|| roster.facilitator());
                leader_rotation(roster, opener)
            } else {
                // Nudge: a full cycle elapsed without a phase exit, so the
                // facilitator speaks first to push toward a proposal.
                leader_rotation(roster, roster.facilitator())
            }
        }
        Phase::Voting => closer_rotation(roster, roster.facilitator()),
        // Non-speaking phases have no turns to assign; fall back to the
        // facilitator so callers never observe an absent actor.
        Phase::Initializing | Phase::Completed => {
            return Actor::Participant(roster.facilitator().id().clone());
        }
    };

    Actor::Participant(order[slot].id().clone())
}

/// Participant messages since the phase began
pub fn phase_turns(conversation: &Conversation, log: &MessageRouter) -> usize {
    phase_messages(conversation, log)
        .filter(|m| m.is_from_participant())
        .count()
}

/// All messages since the phase began
pub fn phase_messages<'a>(
    conversation: &'a Conversation,
    log: &'a MessageRouter,
) -> impl Iterator<Item = &'a Message> {
    let start = conversation.phase_started_seq();
    log.history().iter().filter(move |m| m.seq > start)
}

fn leader_rotation<'a>(roster: &'a Roster, leader: &'a Participant) -> Vec<&'a Participant> {
    let mut order = vec![leader];
    order.extend(roster.members().iter().filter(|m| m.id() != leader.id()));
    order
}

fn closer_rotation<'a>(roster: &'a Roster, closer: &'a Participant) -> Vec<&'a Participant> {
    let mut order: Vec<&Participant> = roster
        .members()
        .iter()
        .filter(|m| m.id() != closer.id())
        .collect();
    order.push(closer);
    order
}
