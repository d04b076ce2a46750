//! Mercato - commerce marketing AI agent
//!
//! CLI entry point for the Mercato server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

mod api;
mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    cli::run(cli).await
}
