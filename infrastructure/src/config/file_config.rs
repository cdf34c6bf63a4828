//! Typed TOML configuration
//!
//! Example configuration:
//!
//! ```toml
//! [conversation]
//! max_rounds = 20
//! max_total_messages = 200
//!
//! [consensus]
//! threshold = 0.8
//! max_voting_rounds = 3
//!
//! [generation]
//! preferred = "ollama"
//! secondary = "openrouter"
//! request_timeout_secs = 30
//!
//! [providers.ollama]
//! base_url = "http://localhost:11434"
//! model = "llama3.1"
//!
//! [providers.openrouter]
//! api_key = "sk-or-..."
//! model = "openai/gpt-4o-mini"
//!
//! [[participants]]
//! id = "alex"
//! name = "Alex"
//! role = "facilitator"
//! system_prompt = "You are Alex..."
//! weight = 1
//! ```

use conclave_application::{Budgets, ConversationSettings, GenerationPolicy};
use conclave_domain::{ConsensusPolicy, Participant, Roster};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration merged from all sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub conversation: ConversationSection,
    pub consensus: ConsensusSection,
    pub generation: GenerationSection,
    pub providers: ProvidersSection,
    pub participants: Vec<ParticipantEntry>,
}

impl FileConfig {
    /// Orchestration settings for new conversations
    pub fn settings(&self) -> ConversationSettings {
        ConversationSettings {
            budgets: self.conversation.budgets(),
            consensus: self.consensus.policy(),
        }
    }

    /// Participant roster; the built-in catalog when none are configured
    pub fn roster(&self) -> Result<Roster, String> {
        if self.participants.is_empty() {
            return Ok(Roster::default_catalog());
        }
        let members = self
            .participants
            .iter()
            .map(|entry| entry.to_participant())
            .collect::<Result<Vec<_>, _>>()?;
        Roster::new(members).map_err(|e| e.to_string())
    }

    /// Range warnings, mirroring the bounds the settings are designed for
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !(3..=100).contains(&self.conversation.max_rounds) {
            issues.push(format!(
                "conversation.max_rounds = {} is outside 3..=100",
                self.conversation.max_rounds
            ));
        }
        if !(0.5..=1.0).contains(&self.consensus.threshold) {
            issues.push(format!(
                "consensus.threshold = {} is outside 0.5..=1.0 and will be clamped",
                self.consensus.threshold
            ));
        }
        if !(5..=300).contains(&self.generation.request_timeout_secs) {
            issues.push(format!(
                "generation.request_timeout_secs = {} is outside 5..=300",
                self.generation.request_timeout_secs
            ));
        }
        if !(100..=50_000).contains(&self.generation.max_response_chars) {
            issues.push(format!(
                "generation.max_response_chars = {} is outside 100..=50000",
                self.generation.max_response_chars
            ));
        }
        issues
    }
}

/// `[conversation]` — round and message budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSection {
    pub max_rounds: u32,
    pub max_total_messages: u64,
    pub exploring_round_cap: u32,
    pub min_discussion_rounds: u32,
    pub stall_rounds: u32,
    pub turn_retry_limit: u32,
}

impl Default for ConversationSection {
    fn default() -> Self {
        let defaults = Budgets::default();
        Self {
            max_rounds: defaults.max_rounds,
            max_total_messages: defaults.max_total_messages,
            exploring_round_cap: defaults.exploring_round_cap,
            min_discussion_rounds: defaults.min_discussion_rounds,
            stall_rounds: defaults.stall_rounds,
            turn_retry_limit: defaults.turn_retry_limit,
        }
    }
}

impl ConversationSection {
    pub fn budgets(&self) -> Budgets {
        Budgets {
            max_rounds: self.max_rounds,
            max_total_messages: self.max_total_messages,
            exploring_round_cap: self.exploring_round_cap,
            min_discussion_rounds: self.min_discussion_rounds,
            stall_rounds: self.stall_rounds,
            turn_retry_limit: self.turn_retry_limit,
        }
    }
}

/// `[consensus]` — quorum policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSection {
    pub threshold: f64,
    pub max_voting_rounds: u32,
    pub enable_forced_decision: bool,
}

impl Default for ConsensusSection {
    fn default() -> Self {
        let defaults = ConsensusPolicy::default();
        Self {
            threshold: defaults.threshold,
            max_voting_rounds: defaults.max_voting_rounds,
            enable_forced_decision: defaults.enable_forced_decision,
        }
    }
}

impl ConsensusSection {
    pub fn policy(&self) -> ConsensusPolicy {
        ConsensusPolicy {
            max_voting_rounds: self.max_voting_rounds,
            enable_forced_decision: self.enable_forced_decision,
            ..ConsensusPolicy::default()
        }
        .with_threshold(self.threshold)
    }
}

/// `[generation]` — backend ordering and failover tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    /// Name of the preferred backend ("ollama" or "openrouter")
    pub preferred: String,
    /// Name of the failover backend; omit for no failover
    pub secondary: Option<String>,
    pub request_timeout_secs: u64,
    pub secondary_timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub max_response_chars: usize,
    pub degrade_window: u32,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            preferred: "ollama".to_string(),
            secondary: Some("openrouter".to_string()),
            request_timeout_secs: 30,
            secondary_timeout_secs: 30,
            retry_backoff_ms: 500,
            max_response_chars: 5000,
            degrade_window: 5,
        }
    }
}

impl GenerationSection {
    pub fn policy(&self) -> GenerationPolicy {
        GenerationPolicy {
            preferred_timeout: Duration::from_secs(self.request_timeout_secs),
            secondary_timeout: Duration::from_secs(self.secondary_timeout_secs),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_response_chars: self.max_response_chars,
            degrade_window: self.degrade_window,
        }
    }
}

/// `[providers]` — per-backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersSection {
    pub ollama: OllamaSection,
    pub openrouter: OpenRouterSection,
}

/// `[providers.ollama]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSection {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
        }
    }
}

/// `[providers.openrouter]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterSection {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenRouterSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
        }
    }
}

/// `[[participants]]` — one roster member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub system_prompt: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl ParticipantEntry {
    pub fn to_participant(&self) -> Result<Participant, String> {
        let role = self.role.parse()?;
        Ok(
            Participant::new(self.id.as_str(), self.name.as_str(), role, &self.system_prompt)
                .with_weight(self.weight),
        )
    }
}
