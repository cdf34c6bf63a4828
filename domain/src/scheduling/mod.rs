//! Deterministic turn scheduling

pub mod turn_scheduler;

pub use turn_scheduler::{next_actor, phase_messages, phase_turns, Actor};
