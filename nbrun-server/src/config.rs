//! Server configuration
//!
//! Defines where notebooks live, which of them may be launched, and how they
//! are executed.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::runner::command::PATH_PLACEHOLDER;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_ALLOWED_TASKS: &[&str] = &["main_1.ipynb", "main_2.ipynb"];
const DEFAULT_TASK_COMMAND: &str = "jupyter nbconvert --to notebook --execute --allow-errors \
     --stdout --ExecutePreprocessor.kernel_name=python3 {path}";
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 600;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Directory containing the notebooks; also the working directory
    /// for every task run
    pub tasks_dir: PathBuf,

    /// Task names that may be launched
    pub allowed_tasks: BTreeSet<String>,

    /// Command used to execute a task, `{path}` is replaced by its file
    pub task_command: Vec<String>,

    /// Ceiling on a single task run, enforced by the process runner
    pub task_timeout: Duration,
}

impl Config {
    /// Creates a configuration rooted at `tasks_dir` with defaults
    pub fn new(tasks_dir: PathBuf) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            tasks_dir,
            allowed_tasks: DEFAULT_ALLOWED_TASKS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            task_command: split_command(DEFAULT_TASK_COMMAND),
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables:
    /// - NBRUN_BIND_ADDR (optional, default: 0.0.0.0:5000)
    /// - NBRUN_TASKS_DIR (optional, default: current directory)
    /// - NBRUN_ALLOWED_TASKS (optional, comma-separated, default: main_1.ipynb,main_2.ipynb)
    /// - NBRUN_TASK_COMMAND (optional, whitespace-separated, must contain {path})
    /// - NBRUN_TASK_TIMEOUT (optional, seconds, default: 600)
    pub fn from_env() -> anyhow::Result<Self> {
        let tasks_dir = match std::env::var("NBRUN_TASKS_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()?,
        };

        let mut config = Self::new(tasks_dir);

        if let Ok(addr) = std::env::var("NBRUN_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(tasks) = std::env::var("NBRUN_ALLOWED_TASKS") {
            config.allowed_tasks = parse_task_list(&tasks);
        }

        if let Ok(command) = std::env::var("NBRUN_TASK_COMMAND") {
            config.task_command = split_command(&command);
        }

        if let Ok(timeout) = std::env::var("NBRUN_TASK_TIMEOUT") {
            let secs = timeout
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("NBRUN_TASK_TIMEOUT must be a number of seconds"))?;
            config.task_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.allowed_tasks.is_empty() {
            anyhow::bail!("allowed_tasks cannot be empty");
        }

        if self.task_command.is_empty() {
            anyhow::bail!("task_command cannot be empty");
        }

        if !self.task_command.iter().any(|a| a.contains(PATH_PLACEHOLDER)) {
            anyhow::bail!("task_command must reference the task file as {PATH_PLACEHOLDER}");
        }

        if self.task_timeout.is_zero() {
            anyhow::bail!("task_timeout must be greater than 0");
        }

        Ok(())
    }
}

fn parse_task_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new(PathBuf::from("/srv/notebooks"));
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.task_timeout, Duration::from_secs(600));
        assert!(config.allowed_tasks.contains("main_1.ipynb"));
        assert!(config.allowed_tasks.contains("main_2.ipynb"));
        assert_eq!(config.task_command[0], "jupyter");
        assert_eq!(config.task_command.last().unwrap(), "{path}");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new(PathBuf::from("."));
        assert!(config.validate().is_ok());

        config.allowed_tasks.clear();
        assert!(config.validate().is_err());
        config.allowed_tasks.insert("main_1.ipynb".to_string());

        config.task_command = vec!["jupyter".to_string(), "run".to_string()];
        assert!(config.validate().is_err());

        config.task_command = Vec::new();
        assert!(config.validate().is_err());

        config.task_command = split_command("papermill {path} {path}");
        assert!(config.validate().is_ok());

        config.task_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_task_list() {
        let tasks = parse_task_list(" a.ipynb, ,b.ipynb,a.ipynb ");
        assert_eq!(
            tasks.into_iter().collect::<Vec<_>>(),
            vec!["a.ipynb".to_string(), "b.ipynb".to_string()]
        );
    }
}
