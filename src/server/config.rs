//! Server configuration types
//!
//! Contains all configuration structures for the Mercato server.

use mercato_core::{AgentSettings, OrchestratorConfig, SynthesisSettings, TruncationPolicy};
use mercato_gateway::{GatewaySettings, NaverCredentials};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorAppConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Agent call parameters
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            search_limit: self.store.search_limit,
            synthesis: SynthesisSettings {
                token_budget: self.synthesis.token_budget,
                truncation: self.synthesis.truncation,
                min_results: self.synthesis.min_results,
            },
        }
    }

    /// Orchestrator settings
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new()
            .with_history_limit(self.orchestrator.history_limit)
            .with_max_execution_secs(self.orchestrator.max_execution_secs)
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}

/// LLM provider
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

// SECURITY: never print the key
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &mercato_llm::util::mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}

/// External data providers
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_datalab_url")]
    pub datalab_url: String,
    #[serde(default)]
    pub datalab_client_id: String,
    #[serde(default)]
    pub datalab_client_secret: String,
    #[serde(default)]
    pub shopping_client_id: String,
    #[serde(default)]
    pub shopping_client_secret: String,
    #[serde(default = "default_requests_per_second")]
    pub shopping_requests_per_second: u32,
}

// SECURITY: never print the secrets
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("timeout_secs", &self.timeout_secs)
            .field("datalab_url", &self.datalab_url)
            .field("datalab_client_id", &self.datalab_client_id)
            .field("shopping_client_id", &self.shopping_client_id)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_gateway_timeout(),
            datalab_url: default_datalab_url(),
            datalab_client_id: String::new(),
            datalab_client_secret: String::new(),
            shopping_client_id: String::new(),
            shopping_client_secret: String::new(),
            shopping_requests_per_second: default_requests_per_second(),
        }
    }
}

impl GatewayConfig {
    /// DataLab credentials, when both halves are set
    pub fn datalab_credentials(&self) -> Option<NaverCredentials> {
        NaverCredentials::from_parts(
            Some(&self.datalab_client_id),
            Some(&self.datalab_client_secret),
        )
    }

    /// Naver search credentials, when both halves are set
    pub fn shopping_credentials(&self) -> Option<NaverCredentials> {
        NaverCredentials::from_parts(
            Some(&self.shopping_client_id),
            Some(&self.shopping_client_secret),
        )
    }

    /// Settings for the data gateway
    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            timeout: Duration::from_secs(self.timeout_secs),
            datalab: self.datalab_credentials(),
            datalab_url: self.datalab_url.clone(),
            shopping: self.shopping_credentials(),
            shopping_requests_per_second: self.shopping_requests_per_second,
        }
    }
}

fn default_gateway_timeout() -> u64 {
    10
}
fn default_datalab_url() -> String {
    "https://openapi.naver.com/v1/datalab/search".to_string()
}
fn default_requests_per_second() -> u32 {
    10
}

/// SQLite store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Empty means the default location
    #[serde(default)]
    pub db_path: String,
    #[serde(default = "default_true")]
    pub full_text: bool,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            full_text: true,
            search_limit: default_search_limit(),
        }
    }
}

impl StoreConfig {
    /// Database file path
    pub fn resolved_path(&self) -> PathBuf {
        if self.db_path.trim().is_empty() {
            mercato_store::default_db_path()
        } else {
            PathBuf::from(self.db_path.trim())
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_search_limit() -> usize {
    5
}

/// Artifact output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Empty means the built-in font
    #[serde(default)]
    pub font_path: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            font_path: String::new(),
        }
    }
}

impl ReportsConfig {
    /// Custom PDF font, when configured
    pub fn font(&self) -> Option<PathBuf> {
        let path = self.font_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}

fn default_output_dir() -> String {
    "reports".to_string()
}

/// Orchestrator configuration (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorAppConfig {
    /// Messages of history handed to agents
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Maximum agent run time in seconds (0 = no limit)
    #[serde(default = "default_max_execution_secs")]
    pub max_execution_secs: u64,
}

impl Default for OrchestratorAppConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_execution_secs: default_max_execution_secs(),
        }
    }
}

fn default_history_limit() -> usize {
    10
}
fn default_max_execution_secs() -> u64 {
    180
}

/// Synthesis limits (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
    #[serde(default)]
    pub truncation: TruncationPolicy,
    #[serde(default = "default_min_results")]
    pub min_results: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            truncation: TruncationPolicy::default(),
            min_results: default_min_results(),
        }
    }
}

fn default_token_budget() -> usize {
    12_000
}
fn default_min_results() -> usize {
    2
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Daily rolling files go here when set
    #[serde(default)]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directory: String::new(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".to_string()
}
