//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use nbrun_client::NbrunClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Launch a notebook in the background
    Launch {
        /// Notebook file name (must be allowed by the server)
        name: String,

        /// Wait for the job to finish, printing progress
        #[arg(short, long)]
        wait: bool,

        /// Poll interval in seconds when waiting
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Show the status of a job
    Status {
        /// Job ID
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<String>,

        /// Show the most recently started job for this notebook instead
        #[arg(long)]
        name: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// Poll a job until it finishes
    Watch {
        /// Job ID
        id: String,

        /// Poll interval in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = NbrunClient::new(config.server_url.as_str());

    match command {
        Commands::Launch {
            name,
            wait,
            interval,
        } => job::launch(&client, &name, wait.then(|| poll_interval(interval))).await,
        Commands::Status { id, name, json } => {
            job::status(&client, id.as_deref(), name.as_deref(), json).await
        }
        Commands::Watch { id, interval } => job::watch(&client, &id, poll_interval(interval)).await,
    }
}

fn poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
