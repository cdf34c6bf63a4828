//! Participant descriptor
//!
//! Participants are configuration data, not runtime objects: a descriptor is
//! immutable and the set of participants for a conversation is fixed at
//! creation time.

use super::role::Role;
use serde::{Deserialize, Serialize};

/// Participant identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId::new(s)
    }
}

/// Static descriptor of one conversational participant
///
/// # Example
///
/// ```
/// use conclave_domain::participant::{Participant, Role};
///
/// let alex = Participant::new("alex", "Alex", Role::Facilitator, "You are Alex...")
///     .with_weight(2);
/// assert_eq!(alex.weight(), 2);
/// assert_eq!(alex.role(), Role::Facilitator);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    role: Role,
    system_prompt: String,
    weight: u32,
}

impl Participant {
    /// Create a participant with the default voting weight of 1
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        role: Role,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            system_prompt: system_prompt.into(),
            weight: 1,
        }
    }

    /// Override the voting weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        ParticipantId::new(s)
    }
}
