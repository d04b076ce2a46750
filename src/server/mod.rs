//! Server module for Mercato
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Fatal checks and provider warnings
//! - `logging`: Tracing subscriber setup
//! - `init`: Component wiring and the HTTP run loop

pub mod config;
mod init;
mod loader;
pub mod logging;
mod validation;

// Re-export public API
pub use init::{build_orchestrator, run};
pub use loader::load_config;
pub use validation::validate_config;
