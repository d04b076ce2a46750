//! Health and banner endpoints
//!
//! - `/healthz` - database ping plus configuration warnings
//! - `/` - service banner

use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use mercato_core::Orchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Configuration warnings collected at startup
#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings(pub Vec<String>);

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub db_connected: bool,
    pub warnings: Vec<String>,
}

/// Service banner
#[derive(Debug, Serialize, Deserialize)]
pub struct BannerResponse {
    pub service: String,
    pub version: String,
    pub status: String,
}

/// `ok` when the database answers, `degraded` otherwise
pub async fn healthz(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Extension(warnings): Extension<Arc<ConfigWarnings>>,
) -> Json<HealthResponse> {
    let db_connected = match orchestrator.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if db_connected { "ok" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        db_connected,
        warnings: warnings.0.clone(),
    })
}

pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        service: "커머스 마케팅 에이전트 API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::orchestrator;
    use super::*;

    #[tokio::test]
    async fn test_healthz_reports_db_and_warnings() {
        let (orch, _dir) = orchestrator().await;
        let warnings = Arc::new(ConfigWarnings(vec!["no font".to_string()]));

        let response = healthz(Extension(orch), Extension(warnings)).await;
        assert_eq!(response.0.status, "ok");
        assert!(response.0.db_connected);
        assert_eq!(response.0.warnings, vec!["no font".to_string()]);
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = root().await;
        assert_eq!(response.0.status, "running");
        assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    }
}
