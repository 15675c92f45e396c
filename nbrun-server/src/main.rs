use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod runner;
pub mod service;

use crate::config::Config;
use crate::repository::JobRegistry;
use crate::runner::{CommandTaskRunner, JobRunner, NotebookDirectory};
use crate::service::JobService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nbrun_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting nbrun server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Serving notebooks from {} (allowed: {:?})",
        config.tasks_dir.display(),
        config.allowed_tasks
    );

    let notebooks = Arc::new(NotebookDirectory::new(config.tasks_dir.clone()));
    let tasks = Arc::new(CommandTaskRunner::new(
        notebooks.clone(),
        &config.task_command,
        notebooks.root(),
        config.task_timeout,
    )?);

    let registry = Arc::new(JobRegistry::new());
    let runner = JobRunner::new(registry.clone(), tasks, notebooks.clone());
    let service = JobService::new(registry, runner, notebooks, config.allowed_tasks.clone());

    // Build router with all API endpoints
    let app = api::create_router(service);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
