//! Mercato Core - routing, agents and chat orchestration
//!
//! This crate ties the service together:
//! - Router: ordered keyword table mapping a message to one task type
//! - Subject: pattern-based extraction of keywords, products and time windows
//! - Agents: trend, ad copy, segment, review, competitor and synthesis
//! - Orchestrator: the per-turn lifecycle (session, messages, agent, reply)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod error;
pub mod orchestrator;
pub mod router;
pub mod subject;

pub use agents::{
    Agent, AgentContext, AgentInput, AgentRegistry, AgentReply, AgentSettings, SynthesisSettings,
    TruncationPolicy,
};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, OrchestratorConfig, TurnInput, TurnReply};
pub use router::{RouteEntry, Router};
