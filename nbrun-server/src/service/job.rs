//! Job Service
//!
//! Validates launch requests, starts runs, and answers status queries.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use nbrun_core::domain::job::JobRecord;
use nbrun_core::dto::job::{JobStatusQuery, JobStatusResponse};
use uuid::Uuid;

use crate::repository::{JobRegistry, RegistryError};
use crate::runner::{JobRunner, TaskCatalog};

/// Service error type
#[derive(Debug)]
pub enum JobError {
    InvalidRequest(String),
    Forbidden(String),
    TaskNotFound { name: String, path: PathBuf },
    NotFound(String),
    NoJobsForTask(String),
}

impl From<RegistryError> for JobError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => JobError::NotFound(id.to_string()),
            RegistryError::NoJobsForTask(name) => JobError::NoJobsForTask(name),
        }
    }
}

/// Public face of the job subsystem
#[derive(Clone)]
pub struct JobService {
    registry: Arc<JobRegistry>,
    runner: JobRunner,
    catalog: Arc<dyn TaskCatalog>,
    allowed: Arc<BTreeSet<String>>,
}

impl JobService {
    pub fn new(
        registry: Arc<JobRegistry>,
        runner: JobRunner,
        catalog: Arc<dyn TaskCatalog>,
        allowed: BTreeSet<String>,
    ) -> Self {
        Self {
            registry,
            runner,
            catalog,
            allowed: Arc::new(allowed),
        }
    }

    /// Validate and launch a task; returns as soon as the job is queued
    pub fn launch(&self, task_name: Option<&str>) -> Result<Uuid, JobError> {
        let name = validate_task_name(task_name)?;

        if !self.allowed.contains(name) {
            return Err(JobError::Forbidden(name.to_string()));
        }

        if !self.catalog.exists(name) {
            return Err(JobError::TaskNotFound {
                name: name.to_string(),
                path: self.catalog.locate(name),
            });
        }

        let job_id = self.registry.create(name);
        self.runner.spawn(job_id, name.to_string());

        tracing::info!(
            "Job {} launched for task {} ({} jobs tracked)",
            job_id,
            name,
            self.registry.len()
        );

        Ok(job_id)
    }

    /// Get a job by ID
    pub fn status(&self, job_id: Uuid) -> Result<JobRecord, JobError> {
        Ok(self.registry.get(job_id)?)
    }

    /// Get the most recently started job for a task
    pub fn status_by_task_name(&self, task_name: &str) -> Result<(Uuid, JobRecord), JobError> {
        Ok(self.registry.latest_by_task_name(task_name)?)
    }

    /// Resolve a status query by id or, failing that, by task name
    pub fn query_status(&self, query: &JobStatusQuery) -> Result<JobStatusResponse, JobError> {
        if let Some(raw_id) = non_empty(query.job_id.as_deref()) {
            tracing::debug!("Getting job: {}", raw_id);
            // A malformed id cannot name any job
            let job_id =
                Uuid::parse_str(raw_id).map_err(|_| JobError::NotFound(raw_id.to_string()))?;
            return self.status(job_id).map(JobStatusResponse::from);
        }

        if let Some(name) = non_empty(query.name.as_deref()) {
            tracing::debug!("Getting latest job for task: {}", name);
            let (job_id, job) = self.status_by_task_name(name)?;
            return Ok(JobStatusResponse::from(job).with_job_id(job_id));
        }

        Err(JobError::InvalidRequest(
            "Provide job_id or name param".to_string(),
        ))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_task_name(task_name: Option<&str>) -> Result<&str, JobError> {
    non_empty(task_name)
        .ok_or_else(|| JobError::InvalidRequest("Missing notebook name".to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
