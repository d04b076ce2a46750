//! Shared agent dependencies and the persist/render/index tail of every run

use crate::error::Result;
use mercato_gateway::DataGateway;
use mercato_llm::util::truncate_chars;
use mercato_llm::{CompletionRequest, LlmProvider, Message};
use mercato_report::{ArtifactFormat, ArtifactRef, ReportDocument, ReportWriter};
use mercato_store::{
    ChatMessage, ChatRole, NewSearchDoc, NewTaskResult, SearchDoc, SearchQuery, Store, TaskResult,
    TaskType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// How synthesis shrinks its input when over budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Keep the most recent result per task type
    #[default]
    LatestPerType,
    /// Keep the most recent result per (task type, product)
    LatestPerTypeAndProduct,
}

/// Synthesis limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Token budget for the serialized inputs
    pub token_budget: usize,
    /// Policy applied when the budget is exceeded
    pub truncation: TruncationPolicy,
    /// Minimum prior results
    pub min_results: usize,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            token_budget: 12_000,
            truncation: TruncationPolicy::default(),
            min_results: 2,
        }
    }
}

/// LLM call parameters shared by all agents
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Model name; empty means the provider default
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion cap
    pub max_tokens: u32,
    /// Prior documents recalled per run
    pub search_limit: usize,
    /// Synthesis limits
    pub synthesis: SynthesisSettings,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 2000,
            search_limit: 5,
            synthesis: SynthesisSettings::default(),
        }
    }
}

/// Result of the persist step
#[derive(Debug, Clone)]
pub struct Persisted {
    /// Stored task result
    pub result: TaskResult,
    /// Artifact, absent when rendering failed
    pub artifact: Option<ArtifactRef>,
}

/// Everything an agent needs, shared across turns
#[derive(Clone)]
pub struct AgentContext {
    /// Persistent store
    pub store: Store,
    /// LLM provider
    pub llm: Arc<dyn LlmProvider>,
    /// External data facade
    pub gateway: Arc<DataGateway>,
    /// Artifact renderer
    pub reports: Arc<ReportWriter>,
    /// Call parameters
    pub settings: AgentSettings,
}

impl AgentContext {
    /// Create a context with default settings
    #[must_use]
    pub fn new(
        store: Store,
        llm: Arc<dyn LlmProvider>,
        gateway: Arc<DataGateway>,
        reports: Arc<ReportWriter>,
    ) -> Self {
        Self {
            store,
            llm,
            gateway,
            reports,
            settings: AgentSettings::default(),
        }
    }

    /// Override the settings
    #[must_use]
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    fn model(&self) -> String {
        if self.settings.model.is_empty() {
            self.llm.default_model().to_string()
        } else {
            self.settings.model.clone()
        }
    }

    /// One system + user completion; provider errors propagate
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = CompletionRequest::new(self.model())
            .with_message(Message::system(system))
            .with_message(Message::user(user))
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }

    /// Completion parsed as JSON; `None` on provider error or bad JSON
    pub async fn complete_json<T: serde::de::DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Option<T> {
        match self.complete(system, user).await {
            Ok(reply) => super::parse_json(&reply),
            Err(e) => {
                warn!(error = %e, "LLM call failed, using local fallback");
                None
            }
        }
    }

    /// Prior documents related to `query`
    pub async fn recall(&self, query: &str, category: TaskType) -> Vec<SearchDoc> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let hits = self
            .store
            .search(
                &SearchQuery::new(query)
                    .in_category(category.as_str())
                    .with_limit(self.settings.search_limit),
            )
            .await;
        debug!(strategy = ?hits.strategy, count = hits.docs.len(), "Recalled prior documents");
        hits.docs
    }

    /// Persist a run: render the artifact, store the result and index a
    /// summary. Render and index failures are logged, store failures
    /// propagate.
    #[instrument(skip(self, payload, document, summary), fields(task_type = %task_type))]
    #[allow(clippy::too_many_arguments)]
    pub async fn persist(
        &self,
        session_id: Uuid,
        task_type: TaskType,
        product: Option<&str>,
        payload: Value,
        document: &ReportDocument,
        format: ArtifactFormat,
        summary: &str,
    ) -> Result<Persisted> {
        let id = Uuid::new_v4();

        let artifact = match self
            .reports
            .write(task_type.as_str(), id, document, format)
            .await
        {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(error = %e, "Report rendering failed, replying without artifact");
                None
            }
        };

        let mut record = NewTaskResult::new(session_id, task_type, payload).with_id(id);
        if let Some(product) = product {
            record = record.with_product(product);
        }
        if let Some(artifact) = &artifact {
            record = match artifact.format {
                ArtifactFormat::Pdf => record.with_pdf_path(artifact.file_name.clone()),
                ArtifactFormat::Html => record.with_html_path(artifact.file_name.clone()),
            };
        }
        let result = self.store.save_task_result(record).await?;

        let mut doc = NewSearchDoc::new(task_type.as_str(), summary)
            .with_metadata("session_id", session_id.to_string())
            .with_metadata("result_id", id.to_string());
        if let Some(product) = product {
            doc = doc.with_metadata("product_name", product);
        }
        if let Err(e) = self.store.add_search_doc(doc).await {
            warn!(error = %e, "Failed to index search document");
        }

        Ok(Persisted { result, artifact })
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("llm", &self.llm.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Recalled documents as a prompt block
pub(crate) fn recall_block(docs: &[SearchDoc]) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let mut block = String::from("\n\n이전 분석 참고:\n");
    for doc in docs {
        block.push_str(&format!(
            "- {}: {}\n",
            doc.title,
            truncate_chars(&doc.content, 300)
        ));
    }
    block
}

/// Conversation history as a prompt block, excluding the current message
pub(crate) fn history_block(history: &[ChatMessage]) -> String {
    let earlier = match history.split_last() {
        Some((_, rest)) => rest,
        None => return String::new(),
    };
    if earlier.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n\n최근 대화:\n");
    for message in earlier {
        let speaker = match message.role {
            ChatRole::User => "사용자",
            ChatRole::Assistant => "어시스턴트",
            ChatRole::System => "시스템",
        };
        block.push_str(&format!(
            "{speaker}: {}\n",
            truncate_chars(&message.content, 200)
        ));
    }
    block
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use mercato_llm::MockProvider;
    use mercato_report::ArtifactStore;

    /// Context over an in-memory store, synthetic data and a temp artifact dir
    pub(crate) async fn context(mock: MockProvider) -> (AgentContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_memory().await.unwrap();
        let reports = ReportWriter::new(ArtifactStore::new(dir.path())).unwrap();
        let ctx = AgentContext::new(
            store,
            Arc::new(mock),
            Arc::new(DataGateway::synthetic_only()),
            Arc::new(reports),
        );
        (ctx, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_llm::MockProvider;
    use mercato_report::ReportSection;

    #[tokio::test]
    async fn test_persist_stores_result_artifact_and_doc() {
        let (ctx, _dir) = test_support::context(MockProvider::new()).await;
        let session = ctx.store.create_session().await.unwrap();
        let doc = ReportDocument::new("트렌드").section(ReportSection::new("요약").paragraph("up"));

        let persisted = ctx
            .persist(
                session.id,
                TaskType::Trend,
                Some("스마트워치"),
                serde_json::json!({"keyword": "스마트워치"}),
                &doc,
                ArtifactFormat::Pdf,
                "스마트워치 트렌드 상승",
            )
            .await
            .unwrap();

        let artifact = persisted.artifact.unwrap();
        let id8 = &persisted.result.id.simple().to_string()[..8];
        assert!(artifact.file_name.starts_with("trend_report_"));
        assert!(artifact.file_name.ends_with(&format!("_{id8}.pdf")));
        assert_eq!(persisted.result.pdf_path.as_deref(), Some(artifact.file_name.as_str()));
        assert_eq!(persisted.result.product_name.as_deref(), Some("스마트워치"));

        let recalled = ctx.recall("스마트워치", TaskType::Trend).await;
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].title, "스마트워치");
    }

    #[tokio::test]
    async fn test_complete_json_falls_back_on_error() {
        let mock = MockProvider::new();
        mock.push_error("boom");
        let (ctx, _dir) = test_support::context(mock).await;
        let parsed: Option<Value> = ctx.complete_json("s", "u").await;
        assert!(parsed.is_none());
    }

    #[test]
    fn test_history_block_skips_current_message() {
        let session_id = Uuid::new_v4();
        let message = |id: i64, role: ChatRole, content: &str| ChatMessage {
            id,
            session_id,
            role,
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        };
        let history = vec![
            message(1, ChatRole::User, "스마트워치 트렌드"),
            message(2, ChatRole::Assistant, "완료"),
            message(3, ChatRole::User, "광고 문구"),
        ];
        let block = history_block(&history);
        assert!(block.contains("사용자: 스마트워치 트렌드"));
        assert!(block.contains("어시스턴트: 완료"));
        assert!(!block.contains("광고 문구"));
        assert!(history_block(&history[..1]).is_empty());
    }
}
