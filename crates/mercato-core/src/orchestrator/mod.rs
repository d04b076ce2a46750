//! Orchestrator - per-turn chat lifecycle
//!
//! Resolves the session, stores the user message, routes to one agent,
//! stores the assistant reply and returns it with any report reference.
//!
//! # Module Structure
//!
//! - `types`: Reply types (TurnReply)
//! - `config`: Configuration types (OrchestratorConfig, TurnInput)
//! - `core`: Orchestrator struct and builder methods
//! - `process`: The turn loop (handle_turn)

mod config;
mod core;
mod process;
mod types;


// Re-export public types
pub use config::{OrchestratorConfig, TurnInput};
pub use core::Orchestrator;
pub use types::TurnReply;
