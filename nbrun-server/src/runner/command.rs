//! Process-backed task runner
//!
//! Executes a task by running an external command (by default `jupyter
//! nbconvert`) against the task's file. The executed notebook is read from
//! the command's stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::task::{Artifact, TaskCatalog, TaskFailure, TaskOutput, TaskRunner};

/// Placeholder replaced by the task's path in command arguments
pub const PATH_PLACEHOLDER: &str = "{path}";

/// How much trailing stderr to keep in a failure
const STDERR_TAIL_CHARS: usize = 1500;

/// Runs tasks as child processes
pub struct CommandTaskRunner {
    catalog: Arc<dyn TaskCatalog>,
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CommandTaskRunner {
    /// Creates a runner from a command line (`program arg...`)
    pub fn new(
        catalog: Arc<dyn TaskCatalog>,
        command: &[String],
        working_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Task command cannot be empty"))?;

        Ok(Self {
            catalog,
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.into(),
            timeout,
        })
    }

    fn build_command(&self, path: &Path) -> Command {
        let path = path.to_string_lossy();
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|a| a.replace(PATH_PLACEHOLDER, &path)))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl TaskRunner for CommandTaskRunner {
    async fn execute(&self, task_name: &str) -> Result<TaskOutput, TaskFailure> {
        let path = self.catalog.locate(task_name);
        info!("Executing {} with {}", path.display(), self.program);

        let child = self
            .build_command(&path)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.program))?;

        // Dropping the wait future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.context("Failed to wait for task process")?,
            Err(_) => {
                return Err(TaskFailure::new(anyhow!(
                    "Task '{}' timed out after {}s",
                    task_name,
                    self.timeout.as_secs()
                )));
            }
        };

        debug!(
            "Task '{}' exited with {} ({} bytes of output)",
            task_name,
            output.status,
            output.stdout.len()
        );

        let artifact = (!output.stdout.is_empty()).then(|| Artifact::new(output.stdout));

        if output.status.success() {
            return Ok(TaskOutput { artifact });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let error = anyhow!("{}", tail_chars(stderr.trim_end(), STDERR_TAIL_CHARS))
            .context(format!("Task '{}' exited with {}", task_name, output.status));

        Err(TaskFailure::new(error).with_partial(artifact))
    }
}

fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    match s.char_indices().nth(count - max) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::NotebookDirectory;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn runner(dir: &Path, command: Vec<String>, timeout: Duration) -> CommandTaskRunner {
        let catalog = Arc::new(NotebookDirectory::new(dir));
        CommandTaskRunner::new(catalog, &command, dir, timeout).unwrap()
    }

    #[test]
    fn test_empty_command_rejected() {
        let catalog = Arc::new(NotebookDirectory::new("."));
        assert!(CommandTaskRunner::new(catalog, &[], ".", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 10), "abcdef");
        assert_eq!(tail_chars("abcdef", 2), "ef");
        assert_eq!(tail_chars("ααβ", 1), "β");
    }

    #[tokio::test]
    async fn test_success_returns_stdout_as_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main_1.ipynb"), "executed").unwrap();
        let runner = runner(dir.path(), sh("cat {path}"), Duration::from_secs(10));

        let output = runner.execute("main_1.ipynb").await.unwrap();
        assert_eq!(output.artifact, Some(Artifact::new("executed")));
    }

    #[tokio::test]
    async fn test_success_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), sh("true"), Duration::from_secs(10));

        let output = runner.execute("main_1.ipynb").await.unwrap();
        assert!(output.artifact.is_none());
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "a,b").unwrap();
        let runner = runner(dir.path(), sh("cat data.csv"), Duration::from_secs(10));

        let output = runner.execute("main_1.ipynb").await.unwrap();
        assert_eq!(output.artifact, Some(Artifact::new("a,b")));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure_with_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(
            dir.path(),
            sh("echo partial; echo 'kernel died' >&2; exit 3"),
            Duration::from_secs(10),
        );

        let failure = runner.execute("main_1.ipynb").await.unwrap_err();
        assert_eq!(failure.partial, Some(Artifact::new("partial\n")));
        let diagnostic = failure.diagnostic();
        assert!(diagnostic.contains("main_1.ipynb"));
        assert!(diagnostic.contains("kernel died"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), sh("sleep 5"), Duration::from_millis(200));

        let failure = runner.execute("main_1.ipynb").await.unwrap_err();
        assert!(failure.diagnostic().contains("timed out"));
        assert!(failure.partial.is_none());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(
            dir.path(),
            vec!["nbrun-definitely-missing-binary".to_string()],
            Duration::from_secs(1),
        );

        let failure = runner.execute("main_1.ipynb").await.unwrap_err();
        assert!(failure.diagnostic().contains("Failed to spawn"));
    }
}
