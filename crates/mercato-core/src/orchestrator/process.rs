//! Orchestrator turn loop
//!
//! Contains the `handle_turn` method and the helpers it uses.

use crate::agents::{Agent, AgentInput, AgentReply};
use crate::error::{Error, Result};
use mercato_store::{ChatRole, Session, TaskType};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::TurnInput;
use super::core::Orchestrator;
use super::types::TurnReply;

impl Orchestrator {
    /// Handle one chat turn.
    ///
    /// Exactly one user and one assistant message are stored per turn, even
    /// when the agent fails. Only session resolution and storage failures
    /// are returned as errors.
    #[tracing::instrument(skip(self, input), fields(session_id))]
    pub async fn handle_turn(&self, input: TurnInput) -> Result<TurnReply> {
        let start_time = std::time::Instant::now();
        let session = self.resolve_session(&input).await?;
        tracing::Span::current().record("session_id", tracing::field::display(session.id));

        self.ctx
            .store
            .append_message(session.id, ChatRole::User, &input.message)
            .await?;
        // The user message is stored; from here the turn must end with a reply
        let history = match self
            .ctx
            .store
            .recent_messages(session.id, self.config.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Failed to load history, continuing without it");
                Vec::new()
            }
        };

        let task_type = self.route(session.id, &input.message).await;
        let (reply, task_type) = match task_type.and_then(|t| self.registry.get(t).map(|a| (t, a))) {
            Some((task_type, agent)) => {
                let agent_input =
                    AgentInput::new(session.id, input.message.clone()).with_history(history);
                match self.run_agent(agent, agent_input).await {
                    Ok(reply) => (reply, Some(task_type)),
                    Err(e) => {
                        if e.is_guidance() {
                            info!(task_type = %task_type, error = %e, "Agent returned guidance");
                        } else {
                            error!(task_type = %task_type, error = %e, "Agent failed");
                        }
                        (AgentReply::text(e.user_message()), Some(task_type))
                    }
                }
            }
            None => {
                if let Some(t) = task_type {
                    warn!(task_type = %t, "No agent registered for routed task type");
                }
                debug!("No route matched, replying with capability listing");
                (AgentReply::text(self.router.capability_message()), None)
            }
        };

        self.ctx
            .store
            .append_message(session.id, ChatRole::Assistant, &reply.reply_text)
            .await?;

        let report_id = reply.artifact.as_ref().map(|a| a.file_name.clone());
        let download_url = report_id.as_deref().map(TurnReply::download_url_for);

        info!(
            task_type = task_type.map(|t| t.as_str()).unwrap_or("none"),
            report = report_id.as_deref().unwrap_or("-"),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Turn completed"
        );

        Ok(TurnReply {
            session_id: session.id,
            reply_text: reply.reply_text,
            report_id,
            download_url,
            task_type,
            result_id: reply.result_id,
        })
    }

    /// Existing session by ID, or a new one when none was requested
    async fn resolve_session(&self, input: &TurnInput) -> Result<Session> {
        let Some(raw) = input.requested_session() else {
            let session = self.ctx.store.create_session().await?;
            info!(session_id = %session.id, "Created session");
            return Ok(session);
        };

        let id = Uuid::parse_str(raw).map_err(|_| Error::NotFound(format!("session {raw}")))?;
        self.ctx
            .store
            .get_session(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {id}")))
    }

    /// Keyword route, else the latest non-synthesis task on a continuation
    async fn route(&self, session_id: Uuid, message: &str) -> Option<TaskType> {
        if let Some(task_type) = self.router.select(message) {
            return Some(task_type);
        }
        if !crate::router::Router::is_continuation(message) {
            return None;
        }

        match self.ctx.store.list_task_results(session_id).await {
            Ok(results) => {
                let previous = results
                    .iter()
                    .rev()
                    .find(|r| r.task_type != TaskType::Synthesis)
                    .map(|r| r.task_type);
                if let Some(t) = previous {
                    debug!(task_type = %t, "Continuation routed to previous task");
                }
                previous
            }
            Err(e) => {
                warn!(error = %e, "Failed to load results for continuation routing");
                None
            }
        }
    }

    /// Run an agent on its own task so a panic becomes an error
    async fn run_agent(&self, agent: Arc<dyn Agent>, input: AgentInput) -> Result<AgentReply> {
        let ctx = self.ctx.clone();
        let mut handle = tokio::spawn(async move { agent.run(&ctx, &input).await });

        let joined = if self.config.max_execution_secs == 0 {
            (&mut handle).await
        } else {
            let limit = Duration::from_secs(self.config.max_execution_secs);
            match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Err(Error::Internal(format!(
                        "agent timed out after {}s",
                        self.config.max_execution_secs
                    )));
                }
            }
        };

        joined.map_err(|e| {
            if e.is_panic() {
                Error::Internal("agent panicked".to_string())
            } else {
                Error::Internal(format!("agent task failed: {e}"))
            }
        })?
    }
}
