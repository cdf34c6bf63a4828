//! Roster: the fixed participant set for one conversation

use super::entities::{Participant, ParticipantId};
use super::role::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when assembling a roster
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RosterError {
    #[error("Roster requires at least one participant")]
    Empty,

    #[error("Duplicate participant id: {0}")]
    DuplicateId(String),

    #[error("Roster requires a facilitator")]
    NoFacilitator,
}

/// Ordered, immutable set of participants
///
/// The member order is the canonical round-robin order used by the turn
/// scheduler, so it must be stable across process restarts. Deserialization
/// goes through [`Roster::new`] so the construction invariants hold for
/// persisted rosters too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Participant>", into = "Vec<Participant>")]
pub struct Roster {
    members: Vec<Participant>,
}

impl TryFrom<Vec<Participant>> for Roster {
    type Error = RosterError;

    fn try_from(members: Vec<Participant>) -> Result<Self, Self::Error> {
        Roster::new(members)
    }
}

impl From<Roster> for Vec<Participant> {
    fn from(roster: Roster) -> Self {
        roster.members
    }
}

impl Roster {
    /// Build a roster, enforcing non-emptiness, unique ids, and the presence
    /// of a facilitator
    pub fn new(members: Vec<Participant>) -> Result<Self, RosterError> {
        if members.is_empty() {
            return Err(RosterError::Empty);
        }
        for (i, member) in members.iter().enumerate() {
            if members[..i].iter().any(|m| m.id() == member.id()) {
                return Err(RosterError::DuplicateId(member.id().to_string()));
            }
        }
        if !members.iter().any(|m| m.role() == Role::Facilitator) {
            return Err(RosterError::NoFacilitator);
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.members.iter().find(|m| m.id() == id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// The facilitator (first member carrying the role; existence is a
    /// construction invariant)
    pub fn facilitator(&self) -> &Participant {
        self.members
            .iter()
            .find(|m| m.role() == Role::Facilitator)
            .expect("roster invariant: facilitator present")
    }

    /// First member carrying the given role, if any
    pub fn find_role(&self, role: Role) -> Option<&Participant> {
        self.members.iter().find(|m| m.role() == role)
    }

    /// Sum of voting weights over all members
    pub fn total_weight(&self) -> u32 {
        self.members.iter().map(|m| m.weight()).sum()
    }

    /// The built-in five-persona catalog used when no participants are
    /// configured
    pub fn default_catalog() -> Self {
        let members = vec![
            Participant::new(
                "alex",
                "Alex",
                Role::Facilitator,
                "You are Alex, a skilled project manager facilitating this team \
                 discussion. Guide the conversation toward the goal, summarize key \
                 points, keep everyone contributing, and ask the user a clarifying \
                 question only when the team genuinely cannot proceed without it. \
                 Be diplomatic, organized, and concise.",
            ),
            Participant::new(
                "sam",
                "Sam",
                Role::Architect,
                "You are Sam, an experienced technical architect. Evaluate the \
                 feasibility of ideas, name concrete technologies and trade-offs, \
                 and call out technical risks early. Be analytical and precise; \
                 prefer practical, implementable solutions.",
            ),
            Participant::new(
                "jordan",
                "Jordan",
                Role::Strategist,
                "You are Jordan, a creative strategist. Generate fresh, sometimes \
                 unconventional candidate solutions, challenge assumptions, and \
                 push the team past the obvious answer. When the discussion phase \
                 starts, put a concrete proposal on the table.",
            ),
            Participant::new(
                "casey",
                "Casey",
                Role::Reviewer,
                "You are Casey, a quality assurance specialist. Probe proposals \
                 for gaps, failure modes, and unstated requirements. Be skeptical \
                 but constructive: every objection should come with what would \
                 satisfy it.",
            ),
            Participant::new(
                "riley",
                "Riley",
                Role::Coordinator,
                "You are Riley, a resource coordinator. Weigh effort, cost, and \
                 timeline. Flag when a proposal is bigger than the goal needs, \
                 and say what the leaner version would look like.",
            ),
        ];
        Self { members }
    }
}
