//! Orchestrator core structure
//!
//! Contains the main `Orchestrator` struct and its builder methods.

use crate::agents::{AgentContext, AgentRegistry};
use crate::router::Router;
use mercato_store::Store;

use super::config::OrchestratorConfig;

/// Coordinates routing, agents and message storage for each turn
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pub(crate) registry: AgentRegistry,
    pub(crate) router: Router,
    pub(crate) ctx: AgentContext,
    pub(crate) config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator over the default router and all six agents
    #[must_use]
    pub fn new(ctx: AgentContext, config: OrchestratorConfig) -> Self {
        Self {
            registry: AgentRegistry::with_defaults(),
            router: Router::new(),
            ctx,
            config,
        }
    }

    /// Replace the agent registry
    #[must_use]
    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the router
    #[must_use]
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Shared agent context
    #[must_use]
    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    /// Persistent store
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.ctx.store
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
