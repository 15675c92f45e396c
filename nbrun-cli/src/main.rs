//! nbrun CLI
//!
//! Command-line interface for launching notebooks on an nbrun server and
//! following their progress.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "nbrun")]
#[command(about = "Launch notebooks in the background and poll their status", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "NBRUN_SERVER_URL", default_value = "http://localhost:5000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
