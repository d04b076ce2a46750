//! Task agents
//!
//! Every agent implements [`Agent`] and follows the same pipeline: extract a
//! subject, recall prior search documents, call the gateway and the LLM,
//! persist a task result, render an artifact and index a summary.
//!
//! ```text
//! AgentRegistry (ordered, built once)
//!   ├─ trend        → PDF
//!   ├─ ad_copy      → PDF
//!   ├─ segment      → PDF
//!   ├─ review       → PDF
//!   ├─ competitor   → HTML
//!   └─ synthesis    → PDF (needs 2+ prior results)
//! ```

mod ad_copy;
mod competitor;
mod context;
mod market;
mod review;
mod segment;
mod synthesis;
mod trend;

pub use ad_copy::AdCopyAgent;
pub use competitor::CompetitorAgent;
pub use context::{AgentContext, AgentSettings, Persisted, SynthesisSettings, TruncationPolicy};
pub use review::ReviewAgent;
pub use segment::SegmentAgent;
pub use synthesis::SynthesisAgent;
pub use trend::TrendAgent;

#[cfg(test)]
pub(crate) use context::test_support;

use crate::error::Result;
use mercato_report::ArtifactRef;
use mercato_store::{ChatMessage, TaskType};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// What an agent receives for one turn
#[derive(Debug, Clone)]
pub struct AgentInput {
    /// Session the turn belongs to
    pub session_id: Uuid,
    /// Current user message
    pub message: String,
    /// Recent messages, oldest first (includes the current one)
    pub history: Vec<ChatMessage>,
    /// Whether the user asked to extend the previous result
    pub continuation: bool,
}

impl AgentInput {
    /// Create an input without history
    #[must_use]
    pub fn new(session_id: Uuid, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            session_id,
            continuation: crate::router::Router::is_continuation(&message),
            message,
            history: Vec::new(),
        }
    }

    /// Attach recent history
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// What an agent hands back to the orchestrator
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    /// Text shown to the user
    pub reply_text: String,
    /// Stored task result, when one was produced
    pub result_id: Option<Uuid>,
    /// Rendered artifact, when rendering succeeded
    pub artifact: Option<ArtifactRef>,
    /// Structured payload of the stored result
    pub result_data: Option<Value>,
}

impl AgentReply {
    /// A reply that stored nothing (guidance, clarification)
    #[must_use]
    pub fn text(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            ..Self::default()
        }
    }

    /// A reply for a persisted run
    #[must_use]
    pub fn completed(reply_text: impl Into<String>, persisted: Persisted) -> Self {
        Self {
            reply_text: reply_text.into(),
            result_id: Some(persisted.result.id),
            artifact: persisted.artifact,
            result_data: Some(persisted.result.result_data),
        }
    }
}

/// A task agent
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Task type this agent produces
    fn task_type(&self) -> TaskType;

    /// Run one turn
    async fn run(&self, ctx: &AgentContext, input: &AgentInput) -> Result<AgentReply>;
}

/// Ordered agent list keyed by task type
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all six agents in routing order
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Arc::new(TrendAgent))
            .register(Arc::new(AdCopyAgent))
            .register(Arc::new(SegmentAgent))
            .register(Arc::new(ReviewAgent))
            .register(Arc::new(CompetitorAgent))
            .register(Arc::new(SynthesisAgent))
    }

    /// Add an agent; a later registration for the same task type replaces
    /// the earlier one in place
    #[must_use]
    pub fn register(mut self, agent: Arc<dyn Agent>) -> Self {
        let task_type = agent.task_type();
        match self.agents.iter().position(|a| a.task_type() == task_type) {
            Some(idx) => self.agents[idx] = agent,
            None => self.agents.push(agent),
        }
        self
    }

    /// Agent for a task type
    #[must_use]
    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn Agent>> {
        self.agents
            .iter()
            .find(|a| a.task_type() == task_type)
            .cloned()
    }

    /// Registered task types in order
    #[must_use]
    pub fn task_types(&self) -> Vec<TaskType> {
        self.agents.iter().map(|a| a.task_type()).collect()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.task_types())
            .finish()
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Parse a JSON payload out of a model reply
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(reply: &str) -> Option<T> {
    let block = mercato_llm::util::extract_json_block(reply)?;
    match serde_json::from_str(block) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Model reply is not the expected JSON");
            None
        }
    }
}

/// Drop markdown markers that the PDF renderer would print literally
pub(crate) fn strip_markdown(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim_start_matches('#').trim_start();
            line.replace("**", "").replace('`', "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a price in won with thousands separators
pub(crate) fn format_won(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{out}원")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_lookup() {
        let registry = AgentRegistry::with_defaults();
        assert_eq!(registry.task_types(), TaskType::ALL.to_vec());
        assert_eq!(
            registry.get(TaskType::Competitor).unwrap().task_type(),
            TaskType::Competitor
        );
        assert!(AgentRegistry::new().get(TaskType::Trend).is_none());
    }

    #[test]
    fn test_register_replaces_same_type() {
        let registry = AgentRegistry::with_defaults().register(Arc::new(TrendAgent));
        assert_eq!(registry.task_types().len(), 6);
    }

    #[test]
    fn test_input_detects_continuation() {
        let input = AgentInput::new(Uuid::new_v4(), "광고 문구 더 만들어줘");
        assert!(input.continuation);
        assert!(!AgentInput::new(Uuid::new_v4(), "광고 문구 만들어줘").continuation);
    }

    #[test]
    fn test_parse_json_fenced() {
        let parsed: Option<serde_json::Value> =
            parse_json("결과입니다\n```json\n{\"a\": 1}\n```");
        assert_eq!(parsed.unwrap()["a"], 1);
        assert!(parse_json::<serde_json::Value>("no json here").is_none());
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(strip_markdown("## 요약\n**굵게** `코드`"), "요약\n굵게 코드");
    }

    #[test]
    fn test_format_won() {
        assert_eq!(format_won(0), "0원");
        assert_eq!(format_won(999), "999원");
        assert_eq!(format_won(1_234_567), "1,234,567원");
    }
}
