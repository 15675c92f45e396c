//! Test doubles for the task collaborators

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::task::{Artifact, ArtifactStore, TaskCatalog, TaskFailure, TaskOutput, TaskRunner};

/// What a scripted task does when executed
#[derive(Debug, Clone)]
pub enum Script {
    Succeed(Option<Vec<u8>>),
    Fail {
        message: String,
        partial: Option<Vec<u8>>,
    },
    Panic,
}

/// Task runner that follows a fixed script, optionally pausing until released
pub struct ScriptedTaskRunner {
    script: Script,
    calls: AtomicUsize,
    held: AtomicBool,
    started: Notify,
    gate: Notify,
}

impl ScriptedTaskRunner {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Make subsequent executions wait for `release`
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
        self.gate.notify_one();
    }

    pub async fn wait_until_started(&self) {
        self.started.notified().await;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskRunner for ScriptedTaskRunner {
    async fn execute(&self, _task_name: &str) -> Result<TaskOutput, TaskFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();

        if self.held.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        match &self.script {
            Script::Succeed(artifact) => Ok(TaskOutput {
                artifact: artifact.clone().map(Artifact::new),
            }),
            Script::Fail { message, partial } => Err(TaskFailure::new(anyhow::anyhow!(
                message.clone()
            ))
            .with_partial(partial.clone().map(Artifact::new))),
            Script::Panic => panic!("scripted task panic"),
        }
    }
}

/// Artifact store that keeps everything in memory
#[derive(Default)]
pub struct MemoryArtifactStore {
    saved: Mutex<Vec<(String, Artifact)>>,
    failing: AtomicBool,
    panicking: AtomicBool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn panic_writes(&self) {
        self.panicking.store(true, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<(String, Artifact)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn persist(&self, task_name: &str, artifact: &Artifact) -> anyhow::Result<()> {
        if self.panicking.load(Ordering::SeqCst) {
            panic!("artifact store panic");
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.saved
            .lock()
            .unwrap()
            .push((task_name.to_string(), artifact.clone()));
        Ok(())
    }
}

/// Catalog with a fixed set of existing tasks
pub struct StaticCatalog {
    existing: HashSet<String>,
}

impl StaticCatalog {
    pub fn new(existing: &[&str]) -> Self {
        Self {
            existing: existing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TaskCatalog for StaticCatalog {
    fn locate(&self, task_name: &str) -> PathBuf {
        PathBuf::from("/notebooks").join(task_name)
    }

    fn exists(&self, task_name: &str) -> bool {
        self.existing.contains(task_name)
    }
}
