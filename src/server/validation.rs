//! Configuration validation
//!
//! A missing LLM key is fatal; missing provider keys only degrade data to
//! synthetic and are reported as warnings (also surfaced by `/healthz`).

use super::config::AppConfig;
use anyhow::{bail, Result};
use tracing::warn;

/// Validate configuration, returning non-fatal warnings
pub fn validate_config(config: &AppConfig) -> Result<Vec<String>> {
    if config.llm.api_key.trim().is_empty() {
        bail!("LLM API key is not configured. Set OPENAI_API_KEY (or MERCATO_LLM__API_KEY).");
    }

    let mut warnings = Vec::new();
    if config.gateway.datalab_credentials().is_none() {
        warnings.push(
            "Naver DataLab credentials missing; trend data will be synthetic".to_string(),
        );
    }
    if config.gateway.shopping_credentials().is_none() {
        warnings.push(
            "Naver search credentials missing; shopping and review data will be synthetic"
                .to_string(),
        );
    }
    if config.reports.font().is_none() {
        warnings.push(
            "No PDF font configured; non-Latin text renders as '?' (set REPORT_FONT_PATH)"
                .to_string(),
        );
    }

    let is_production = std::env::var("MERCATO_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);
    if is_production && config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy."
        );
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    Ok(warnings)
}
