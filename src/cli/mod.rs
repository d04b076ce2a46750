//! CLI module for Mercato
//!
//! Provides commands:
//! - `serve`: Start the HTTP server (default)
//! - `check`: Validate configuration and storage

use clap::{Parser, Subcommand};

pub mod check;

/// Mercato commerce marketing agent
#[derive(Parser, Debug)]
#[command(name = "mercato")]
#[command(about = "Commerce marketing AI agent service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Validate configuration and print warnings
    Check,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Check) => check::run().await,
        Some(Commands::Serve) | None => crate::server::run().await,
    }
}
