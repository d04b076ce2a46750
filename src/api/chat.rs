//! Chat endpoint
//!
//! POST /chat - run one turn: `{message, session_id?}` in,
//! `{session_id, reply_text, report_id?, download_url?}` out.

use axum::{Extension, Json};
use mercato_core::{Orchestrator, TurnInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ApiJson};

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply_text: String,
    pub report_id: Option<String>,
    pub download_url: Option<String>,
}

/// Handle one chat turn. Agent failures come back as 200 replies.
pub async fn chat(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::unprocessable("message must not be empty"));
    }

    let mut input = TurnInput::new(request.message);
    if let Some(session_id) = request.session_id {
        input = input.with_session(session_id);
    }

    let reply = orchestrator.handle_turn(input).await?;
    Ok(Json(ChatResponse {
        session_id: reply.session_id.to_string(),
        reply_text: reply.reply_text,
        report_id: reply.report_id,
        download_url: reply.download_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::orchestrator;
    use super::*;
    use axum::http::StatusCode;

    fn request(message: &str, session_id: Option<String>) -> ApiJson<ChatRequest> {
        ApiJson(ChatRequest {
            message: message.to_string(),
            session_id,
        })
    }

    #[tokio::test]
    async fn test_greeting_lists_capabilities() {
        let (orch, _dir) = orchestrator().await;
        let response = chat(Extension(orch), request("안녕", None)).await.unwrap();
        assert!(response.0.reply_text.contains("사용 가능한 태스크"));
        assert!(response.0.report_id.is_none());
        assert!(response.0.download_url.is_none());
    }

    #[tokio::test]
    async fn test_blank_message_is_unprocessable() {
        let (orch, _dir) = orchestrator().await;
        let err = chat(Extension(orch), request("  ", None)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (orch, _dir) = orchestrator().await;
        let err = chat(
            Extension(orch),
            request("안녕", Some(uuid::Uuid::new_v4().to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_is_reused() {
        let (orch, _dir) = orchestrator().await;
        let first = chat(Extension(orch.clone()), request("안녕", Some(String::new())))
            .await
            .unwrap();
        let second = chat(
            Extension(orch),
            request("안녕", Some(first.0.session_id.clone())),
        )
        .await
        .unwrap();
        assert_eq!(first.0.session_id, second.0.session_id);
    }
}
