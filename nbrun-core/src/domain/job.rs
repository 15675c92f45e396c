//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Upper bound on the length of a job message, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

pub const MESSAGE_QUEUED: &str = "Queued";
pub const MESSAGE_STARTED: &str = "Started";
pub const MESSAGE_EXECUTING: &str = "Executing task";
pub const MESSAGE_COMPLETED: &str = "Completed successfully";

/// Background job record
///
/// One record exists per launched task instance. The server creates it in
/// `Pending` and only ever moves it forward through the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub task_name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: String,
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

/// Rejected attempt to move a job backwards or out of a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition from {from} to {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobRecord {
    /// Creates a queued record for a freshly launched task
    pub fn new(id: Uuid, task_name: impl Into<String>) -> Self {
        Self {
            id,
            task_name: task_name.into(),
            status: JobStatus::Pending,
            progress: 0,
            started_at: None,
            finished_at: None,
            message: MESSAGE_QUEUED.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// pending -> running
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Running)?;
        self.advance_progress(1);
        self.started_at = Some(at);
        self.message = MESSAGE_STARTED.to_string();
        Ok(())
    }

    /// running -> done
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Done)?;
        self.advance_progress(100);
        self.finished_at = Some(at);
        self.message = MESSAGE_COMPLETED.to_string();
        Ok(())
    }

    /// running -> error
    ///
    /// The diagnostic is cut to [`MAX_MESSAGE_CHARS`] characters.
    pub fn fail(&mut self, at: DateTime<Utc>, diagnostic: &str) -> Result<(), TransitionError> {
        self.transition(JobStatus::Error)?;
        self.advance_progress(100);
        self.finished_at = Some(at);
        self.message = truncate_message(diagnostic);
        Ok(())
    }

    /// Replaces the message without changing status
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = truncate_message(&message.into());
    }

    /// Raises progress to `progress` (capped at 100); never lowers it
    pub fn advance_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Keeps the first [`MAX_MESSAGE_CHARS`] characters of `message`
pub fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((byte_idx, _)) => message[..byte_idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new(Uuid::new_v4(), "main_1.ipynb")
    }

    #[test]
    fn test_new_record_is_queued() {
        let job = record();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, "Queued");
        assert!(job.started_at.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = record();
        let started = Utc::now();
        job.start(started).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 1);
        assert_eq!(job.started_at, Some(started));
        assert!(job.finished_at.is_none());

        job.complete(Utc::now()).unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, 100);
        assert!(job.finished_at.is_some());
        assert_eq!(job.message, "Completed successfully");
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut job = record();
        job.start(Utc::now()).unwrap();
        job.fail(Utc::now(), "boom").unwrap();

        let snapshot = job.clone();
        assert!(job.start(Utc::now()).is_err());
        assert!(job.complete(Utc::now()).is_err());
        assert!(job.fail(Utc::now(), "again").is_err());
        assert_eq!(job, snapshot);
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut job = record();
        let err = job.complete(Utc::now()).unwrap_err();
        assert_eq!(err.from, JobStatus::Pending);
        assert_eq!(err.to, JobStatus::Done);
        assert!(job.fail(Utc::now(), "nope").is_err());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_fail_truncates_message() {
        let mut job = record();
        job.start(Utc::now()).unwrap();
        job.fail(Utc::now(), &"é".repeat(5000)).unwrap();
        assert_eq!(job.message.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut job = record();
        job.advance_progress(40);
        job.advance_progress(10);
        assert_eq!(job.progress, 40);
        job.advance_progress(250);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let parsed: JobStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, JobStatus::Error);
    }
}
