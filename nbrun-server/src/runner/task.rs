//! Task collaborator seams
//!
//! The job runner does not know how a task is executed or where its output
//! goes. It only talks to these traits.

use std::path::PathBuf;

use async_trait::async_trait;

/// Output produced by a task run (the executed notebook, for example)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Successful task run
#[derive(Debug, Default)]
pub struct TaskOutput {
    pub artifact: Option<Artifact>,
}

/// Failed task run
///
/// Carries whatever partial output existed when the task failed so that it
/// can still be saved.
#[derive(Debug)]
pub struct TaskFailure {
    pub error: anyhow::Error,
    pub partial: Option<Artifact>,
}

impl TaskFailure {
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: Option<Artifact>) -> Self {
        self.partial = partial;
        self
    }

    /// Human-readable diagnostic including the full cause chain
    pub fn diagnostic(&self) -> String {
        format!("Exception: {:?}", self.error)
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

/// Executes a named task to completion
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn execute(&self, task_name: &str) -> Result<TaskOutput, TaskFailure>;
}

/// Resolves task names to their definitions
pub trait TaskCatalog: Send + Sync {
    /// Where the task definition is expected to live
    fn locate(&self, task_name: &str) -> PathBuf;

    fn exists(&self, task_name: &str) -> bool {
        self.locate(task_name).is_file()
    }
}

/// Saves task output back to where the task came from
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn persist(&self, task_name: &str, artifact: &Artifact) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_diagnostic_includes_causes() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("kernel died"));
        let err = err.context("Failed to execute main_1.ipynb").unwrap_err();

        let diagnostic = TaskFailure::new(err).diagnostic();
        assert!(diagnostic.starts_with("Exception: Failed to execute main_1.ipynb"));
        assert!(diagnostic.contains("Caused by"));
        assert!(diagnostic.contains("kernel died"));
    }

    #[test]
    fn test_with_partial() {
        let failure =
            TaskFailure::new(anyhow::anyhow!("boom")).with_partial(Some(Artifact::new("{}")));
        assert_eq!(failure.partial, Some(Artifact::new("{}")));
    }
}
