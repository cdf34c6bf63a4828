//! Configuration loading and typed TOML sections

pub mod file_config;
pub mod loader;

pub use file_config::{
    ConsensusSection, ConversationSection, FileConfig, GenerationSection, OllamaSection,
    OpenRouterSection, ParticipantEntry, ProvidersSection,
};
pub use loader::ConfigLoader;
