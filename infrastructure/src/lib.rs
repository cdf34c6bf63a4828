//! Infrastructure layer for conclave
//!
//! External adapters: LLM backends over HTTP, configuration loading, the
//! in-memory conversation store, and the JSONL transcript sink.

pub mod config;
pub mod events;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use events::JsonlEventSink;
pub use providers::{build_backend, OllamaBackend, OpenRouterBackend};
pub use storage::InMemoryConversationStore;
