//! CLI entry point for the computer-use agent execution core.

mod cli;
mod commands;
mod output;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    if let Err(e) = pilotcore_observability::init_from_env() {
        output::error(&format!("observability init failed: {e}"));
    }

    let cli = Cli::parse();

    if let Err(e) = commands::handle(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
