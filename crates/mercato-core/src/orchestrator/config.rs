//! Orchestrator configuration
//!
//! Contains configuration types for the orchestrator:
//! - `OrchestratorConfig` for orchestrator settings
//! - `TurnInput` for one chat turn

use uuid::Uuid;

/// Input for one chat turn
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// User message
    pub message: String,
    /// Session to continue; absent or blank starts a new one
    pub session_id: Option<String>,
}

impl TurnInput {
    /// Create an input that starts a new session
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
        }
    }

    /// Continue an existing session
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Continue an existing session by ID
    #[must_use]
    pub fn with_session_id(self, session_id: Uuid) -> Self {
        self.with_session(session_id.to_string())
    }

    /// The requested session, `None` when absent or blank
    #[must_use]
    pub fn requested_session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Messages of history handed to agents
    pub history_limit: usize,
    /// Maximum agent run time in seconds (0 = no limit)
    pub max_execution_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            max_execution_secs: 180,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history window
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the agent time limit
    #[must_use]
    pub fn with_max_execution_secs(mut self, secs: u64) -> Self {
        self.max_execution_secs = secs;
        self
    }
}
