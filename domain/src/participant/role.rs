//! Participant roles
//!
//! Roles are a closed set of identifiers mapped to data-only behavior: the
//! scheduler interprets them as a table lookup (who opens a phase, who casts
//! the closing vote), never as subclassed agent types.

use crate::conversation::Phase;
use serde::{Deserialize, Serialize};

/// Role a participant plays in the deliberation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Guides the conversation; opens exploration, closes voting, and is the
    /// tie-breaking "nudge" speaker when a round completes without progress
    Facilitator,
    /// Evaluates technical feasibility and constraints
    Architect,
    /// Generates candidate solutions; initiates the discussion phase
    Strategist,
    /// Challenges proposals for quality, risk, and edge cases
    Reviewer,
    /// Weighs effort, cost, and resource constraints
    Coordinator,
}

impl Role {
    /// All roles, in catalog order
    pub fn all() -> [Role; 5] {
        [
            Role::Facilitator,
            Role::Architect,
            Role::Strategist,
            Role::Reviewer,
            Role::Coordinator,
        ]
    }

    /// Whether this role takes speaking turns in the given phase
    ///
    /// Every role speaks in every speaking phase today; the filter exists so
    /// per-phase eligibility stays configuration, not code.
    pub fn speaks_in(&self, phase: Phase) -> bool {
        phase.is_speaking()
    }

    /// Whether this role takes the opening turn of the given phase
    pub fn opens(&self, phase: Phase) -> bool {
        match phase {
            Phase::Exploring => matches!(self, Role::Facilitator),
            Phase::Discussing => matches!(self, Role::Strategist),
            _ => false,
        }
    }

    /// Whether this role takes the closing turn of the given phase
    pub fn closes(&self, phase: Phase) -> bool {
        matches!(phase, Phase::Voting) && matches!(self, Role::Facilitator)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Facilitator => "Facilitator",
            Role::Architect => "Architect",
            Role::Strategist => "Strategist",
            Role::Reviewer => "Reviewer",
            Role::Coordinator => "Coordinator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facilitator" | "project_manager" | "project manager" => Ok(Role::Facilitator),
            "architect" | "technical_architect" | "technical architect" => Ok(Role::Architect),
            "strategist" | "creative_strategist" | "creative strategist" => Ok(Role::Strategist),
            "reviewer" | "quality_assurance" | "quality assurance" => Ok(Role::Reviewer),
            "coordinator" | "resource_coordinator" | "resource coordinator" => {
                Ok(Role::Coordinator)
            }
            _ => Err(format!(
                "Unknown role: {}. Valid: facilitator, architect, strategist, reviewer, coordinator",
                s
            )),
        }
    }
}
