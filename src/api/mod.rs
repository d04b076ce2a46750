//! Web API module for Mercato
//!
//! Provides REST API endpoints for:
//! - Chat turns
//! - Report downloads
//! - Health and service banner

pub mod chat;
pub mod error;
pub mod health;
pub mod report;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use mercato_core::Orchestrator;
use std::sync::Arc;

pub use error::ApiError;
pub use health::ConfigWarnings;

/// Create the API router with all endpoints
pub fn router(orchestrator: Arc<Orchestrator>, warnings: Arc<ConfigWarnings>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/chat", post(chat::chat))
        .route("/report/:report_id", get(report::download))
        .layer(Extension(orchestrator))
        .layer(Extension(warnings))
}

#[cfg(test)]
pub(crate) mod test_support {
    use mercato_core::{AgentContext, Orchestrator, OrchestratorConfig};
    use mercato_gateway::DataGateway;
    use mercato_llm::MockProvider;
    use mercato_report::{ArtifactStore, ReportWriter};
    use mercato_store::Store;
    use std::sync::Arc;

    /// Orchestrator over an in-memory store, a mock LLM and synthetic data
    pub(crate) async fn orchestrator() -> (Arc<Orchestrator>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AgentContext::new(
            Store::in_memory().await.unwrap(),
            Arc::new(MockProvider::new()),
            Arc::new(DataGateway::synthetic_only()),
            Arc::new(ReportWriter::new(ArtifactStore::new(dir.path())).unwrap()),
        );
        (
            Arc::new(Orchestrator::new(ctx, OrchestratorConfig::default())),
            dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_routes() {
        let (orch, _dir) = test_support::orchestrator().await;
        let app = router(orch, Arc::new(ConfigWarnings::default()));

        let (status, body) = send(
            app.clone(),
            Request::post("/chat")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": "안녕"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["report_id"].is_null());
        assert!(body["session_id"].as_str().is_some());

        let (status, body) = send(
            app.clone(),
            Request::get("/report/missing.pdf").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().is_some());

        let (status, body) = send(app, Request::get("/healthz").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_bad_chat_bodies_return_detail() {
        let (orch, _dir) = test_support::orchestrator().await;
        let app = router(orch, Arc::new(ConfigWarnings::default()));
        let post = |body: &'static str, content_type: &str| {
            Request::post("/chat")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap()
        };

        let (status, body) = send(app.clone(), post(r#"{"message": "안녕""#, "application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

        let (status, body) = send(app.clone(), post(r#"{"session_id": "x"}"#, "application/json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("message"));

        let (status, body) = send(app, post(r#"{"message": "안녕"}"#, "text/plain")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["detail"].is_string());
    }
}
