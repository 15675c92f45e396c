//! Job runner
//!
//! Drives a single job through its state machine:
//! - pending -> running when the worker starts
//! - running -> done when the task returns
//! - running -> error when the task fails or panics
//!
//! Each job runs in its own detached tokio task. Nothing that happens inside
//! a task is ever propagated to the launcher; the outcome is only visible by
//! polling the registry.

pub mod command;
pub mod notebook_dir;
pub mod task;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use chrono::Utc;
use nbrun_core::domain::job::{JobRecord, MESSAGE_EXECUTING, TransitionError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::repository::JobRegistry;

pub use command::CommandTaskRunner;
pub use notebook_dir::NotebookDirectory;
pub use task::{Artifact, ArtifactStore, TaskCatalog, TaskFailure, TaskOutput, TaskRunner};

/// Runs jobs against a task runner and records the outcome
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    tasks: Arc<dyn TaskRunner>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl JobRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        tasks: Arc<dyn TaskRunner>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            registry,
            tasks,
            artifacts,
        }
    }

    /// Spawns a detached task that runs the job
    pub fn spawn(&self, job_id: Uuid, task_name: String) -> tokio::task::JoinHandle<()> {
        let runner = self.clone();

        tokio::spawn(async move {
            runner.run(job_id, &task_name).await;
        })
    }

    /// Runs the job to completion, recording every transition
    pub async fn run(&self, job_id: Uuid, task_name: &str) {
        if !self.transition(job_id, |job| job.start(Utc::now())) {
            return;
        }
        info!("Job {} started ({})", job_id, task_name);

        if let Err(e) = self
            .registry
            .update(job_id, |job| job.set_message(MESSAGE_EXECUTING))
        {
            error!("Failed to update job {}: {}", job_id, e);
        }

        match self.execute(task_name).await {
            Ok(output) => {
                if let Some(artifact) = output.artifact {
                    self.persist(job_id, task_name, artifact).await;
                }
                if self.transition(job_id, |job| job.complete(Utc::now())) {
                    info!("Job {} completed successfully", job_id);
                }
            }
            Err(failure) => {
                error!("Job {} failed: {:#}", job_id, failure.error);
                let diagnostic = failure.diagnostic();
                if let Some(artifact) = failure.partial {
                    self.persist(job_id, task_name, artifact).await;
                }
                self.transition(job_id, |job| job.fail(Utc::now(), &diagnostic));
            }
        }
    }

    /// Calls the task runner in its own task so a panic becomes a failure
    async fn execute(&self, task_name: &str) -> Result<TaskOutput, TaskFailure> {
        let tasks = Arc::clone(&self.tasks);
        let name = task_name.to_string();

        match tokio::spawn(async move { tasks.execute(&name).await }).await {
            Ok(outcome) => outcome,
            Err(e) => Err(TaskFailure::new(anyhow::anyhow!(
                "Task execution aborted: {}",
                e
            ))),
        }
    }

    /// Saves task output; failures and panics are logged and otherwise ignored
    async fn persist(&self, job_id: Uuid, task_name: &str, artifact: Artifact) {
        let artifacts = Arc::clone(&self.artifacts);
        let name = task_name.to_string();

        match tokio::spawn(async move { artifacts.persist(&name, &artifact).await }).await {
            Ok(Ok(())) => debug!("Saved output of job {} to {}", job_id, task_name),
            Ok(Err(e)) => warn!("Failed to save output of job {}: {:#}", job_id, e),
            Err(e) => warn!("Saving output of job {} aborted: {}", job_id, e),
        }
    }

    fn transition<F>(&self, job_id: Uuid, apply: F) -> bool
    where
        F: FnOnce(&mut JobRecord) -> Result<(), TransitionError>,
    {
        match self.registry.update(job_id, apply) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Job {}: {}", job_id, e);
                false
            }
            Err(e) => {
                error!("Failed to update job {}: {}", job_id, e);
                false
            }
        }
    }
}
