//! Server initialization and run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::logging;
use super::validation::validate_config;
use crate::api::{self, ConfigWarnings};
use anyhow::{Context, Result};
use mercato_core::{AgentContext, Orchestrator};
use mercato_gateway::DataGateway;
use mercato_llm::{OpenAiConfig, OpenAiProvider};
use mercato_report::{ArtifactStore, PdfRenderer, ReportWriter};
use mercato_store::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Build every component the chat loop needs
pub async fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let llm = OpenAiProvider::new(
        OpenAiConfig::new(config.llm.api_key.trim())
            .with_model(&config.llm.model)
            .with_base_url(&config.llm.base_url)
            .with_timeout(Duration::from_secs(config.llm.timeout_secs)),
    )
    .context("Failed to initialize LLM provider")?;

    let db_path = config.store.resolved_path();
    let store = Store::from_path(&db_path)
        .await
        .with_context(|| format!("Failed to open store at {}", db_path.display()))?;
    if !config.store.full_text {
        store.set_full_text_enabled(false).await;
    }

    let gateway = DataGateway::from_settings(&config.gateway.settings())
        .context("Failed to initialize data gateway")?;

    let mut pdf = PdfRenderer::new();
    if let Some(font) = config.reports.font() {
        pdf = pdf.with_font(font);
    }
    let reports = ReportWriter::new(ArtifactStore::new(&config.reports.output_dir))
        .context("Failed to initialize report writer")?
        .with_pdf_renderer(pdf);
    info!(dir = %config.reports.output_dir, "Report output directory");

    let ctx = AgentContext::new(store, Arc::new(llm), Arc::new(gateway), Arc::new(reports))
        .with_settings(config.agent_settings());
    Ok(Orchestrator::new(ctx, config.orchestrator_config()))
}

/// Run the server
pub async fn run() -> Result<()> {
    let config = load_config()?;
    let _log_guard = logging::init(&config.logging);

    info!("Starting Mercato v{}", env!("CARGO_PKG_VERSION"));
    let warnings = validate_config(&config)?;

    let orchestrator = Arc::new(build_orchestrator(&config).await?);

    let app = api::router(orchestrator, Arc::new(ConfigWarnings(warnings)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Mercato stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
