//! Notebook directory
//!
//! Tasks are notebook files in a single directory. The directory answers
//! whether a notebook exists and receives the executed notebook afterwards.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::task::{Artifact, ArtifactStore, TaskCatalog};

/// Directory holding the launchable notebooks
#[derive(Debug, Clone)]
pub struct NotebookDirectory {
    root: PathBuf,
}

impl NotebookDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TaskCatalog for NotebookDirectory {
    fn locate(&self, task_name: &str) -> PathBuf {
        self.root.join(task_name)
    }
}

#[async_trait]
impl ArtifactStore for NotebookDirectory {
    /// Overwrites the notebook with the executed copy
    ///
    /// Writes a sibling temp file first and renames it over the target, so a
    /// failed write leaves the original notebook intact. Each call gets its
    /// own temp file; concurrent runs of one notebook end with the last
    /// rename winning.
    async fn persist(&self, task_name: &str, artifact: &Artifact) -> Result<()> {
        let target = self.locate(task_name);
        let tmp = self
            .root
            .join(format!(".{}.{}.nbrun-tmp", task_name, Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, &artifact.bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;

        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace {}", target.display()));
        }

        debug!(
            "Wrote {} bytes to {}",
            artifact.bytes.len(),
            target.display()
        );
        Ok(())
    }
}
