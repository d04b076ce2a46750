//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Plain env variables mapped onto config keys, applied last
pub const ENV_ALIASES: [(&str, &str); 11] = [
    ("OPENAI_API_KEY", "llm.api_key"),
    ("OPENAI_MODEL", "llm.model"),
    ("OPENAI_BASE_URL", "llm.base_url"),
    ("NAVER_DATALAB_CLIENT_ID", "gateway.datalab_client_id"),
    ("NAVER_DATALAB_CLIENT_SECRET", "gateway.datalab_client_secret"),
    ("NAVER_DATALAB_URL", "gateway.datalab_url"),
    ("NAVER_SHOPPING_CLIENT_ID", "gateway.shopping_client_id"),
    ("NAVER_SHOPPING_CLIENT_SECRET", "gateway.shopping_client_secret"),
    ("DB_PATH", "store.db_path"),
    ("REPORT_DIR", "reports.output_dir"),
    ("REPORT_FONT_PATH", "reports.font_path"),
];

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("MERCATO_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables
        // prefix_separator("_") makes MERCATO_SERVER__PORT work (single _ after prefix).
        .add_source(
            Environment::with_prefix("MERCATO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // 4. Plain aliases (highest priority)
    let builder = apply_aliases(builder, |name| std::env::var(name).ok())?;

    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Override config keys from the alias table; blank values are ignored
fn apply_aliases(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>> {
    for (var, key) in ENV_ALIASES {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        builder = builder
            .set_override_option(key, value)
            .with_context(|| format!("Failed to apply {var}"))?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(env: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        apply_aliases(builder, |name| env.get(name).cloned())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = load_with(&[]);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.orchestrator.history_limit, 10);
        assert_eq!(config.synthesis.token_budget, 12_000);
        assert!(config.llm.api_key.is_empty());
        assert!(config.store.full_text);
    }

    #[test]
    fn test_aliases_override_defaults() {
        let config = load_with(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DB_PATH", "/tmp/m.db"),
            ("REPORT_DIR", "/tmp/reports"),
            ("NAVER_SHOPPING_CLIENT_ID", "  "),
        ]);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.store.db_path, "/tmp/m.db");
        assert_eq!(config.reports.output_dir, "/tmp/reports");
        assert!(config.gateway.shopping_client_id.is_empty());
    }
}
