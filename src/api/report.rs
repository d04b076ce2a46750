//! Report download endpoint
//!
//! GET /report/{report_id} - stream a rendered artifact.

use axum::{
    body::Body,
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use mercato_core::Orchestrator;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::error;

use super::error::ApiError;

/// Stream an artifact with its content type
pub async fn download(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(report_id): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = orchestrator
        .context()
        .reports
        .artifacts()
        .resolve(&report_id)
        .await?;

    let file = tokio::fs::File::open(&artifact.path).await.map_err(|e| {
        error!(error = %e, report_id = %report_id, "Failed to open artifact");
        ApiError::not_found(format!("Report not found: {report_id}"))
    })?;

    let headers = [
        (header::CONTENT_TYPE, artifact.format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", artifact.file_name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::orchestrator;
    use super::*;
    use axum::http::StatusCode;
    use mercato_core::TurnInput;

    #[tokio::test]
    async fn test_download_streams_pdf() {
        let (orch, _dir) = orchestrator().await;
        let reply = orch
            .handle_turn(TurnInput::new("스마트워치 트렌드 분석"))
            .await
            .unwrap();
        let report_id = reply.report_id.unwrap();

        let response = download(Extension(orch), Path(report_id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let (orch, _dir) = orchestrator().await;
        for id in ["..", "a..pdf", "x\\y.pdf"] {
            let err = download(Extension(orch.clone()), Path(id.to_string()))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{id}");
        }
    }

    #[tokio::test]
    async fn test_unknown_report_is_not_found() {
        let (orch, _dir) = orchestrator().await;
        let err = download(
            Extension(orch),
            Path("trend_report_20240101_000000_deadbeef.pdf".to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
