//! Job DTOs for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{JobRecord, JobStatus};

/// Request to launch a task in the background
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchJob {
    pub name: Option<String>,
}

/// Response to a successful launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchedJob {
    pub job_id: Uuid,
}

/// Query parameters for a status lookup
///
/// Either field may be given. `job_id` is kept as a raw string so that a
/// malformed id is answered like any unknown id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatusQuery {
    pub job_id: Option<String>,
    pub name: Option<String>,
}

/// Job status as reported to clients
///
/// `job_id` is only present when the job was looked up by task name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    pub name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: String,
}

impl JobStatusResponse {
    pub fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

impl From<JobRecord> for JobStatusResponse {
    fn from(job: JobRecord) -> Self {
        Self {
            job_id: None,
            name: job.task_name,
            status: job.status,
            progress: job.progress,
            started_at: job.started_at,
            finished_at: job.finished_at,
            message: job.message,
        }
    }
}
