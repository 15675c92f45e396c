//! Job Registry
//!
//! In-memory store of every job launched since the process started.
//! The registry is the only synchronization point for job state: callers
//! never lock anything themselves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nbrun_core::domain::job::JobRecord;
use thiserror::Error;
use uuid::Uuid;

/// Registry lookup failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("no jobs for task {0}")]
    NoJobsForTask(String),
}

/// A stored record plus its creation sequence number
struct Slot {
    seq: u64,
    record: JobRecord,
}

#[derive(Default)]
struct Jobs {
    next_seq: u64,
    by_id: HashMap<Uuid, Slot>,
}

/// Thread-safe job table
///
/// A single mutex guards the whole map. The lock is never held across an
/// `.await`, so a std mutex is enough.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<Jobs>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending job and return its id
    pub fn create(&self, task_name: &str) -> Uuid {
        let mut jobs = self.lock();

        let mut id = Uuid::new_v4();
        while jobs.by_id.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let seq = jobs.next_seq;
        jobs.next_seq += 1;
        jobs.by_id.insert(
            id,
            Slot {
                seq,
                record: JobRecord::new(id, task_name),
            },
        );

        id
    }

    /// Snapshot of a job
    pub fn get(&self, id: Uuid) -> Result<JobRecord, RegistryError> {
        self.lock()
            .by_id
            .get(&id)
            .map(|slot| slot.record.clone())
            .ok_or(RegistryError::NotFound(id))
    }

    /// Apply `mutate` to a job while holding the lock
    ///
    /// Returns whatever the closure returns, so callers can surface
    /// domain-level rejections (e.g. an illegal transition).
    pub fn update<F, R>(&self, id: Uuid, mutate: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut JobRecord) -> R,
    {
        let mut jobs = self.lock();
        let slot = jobs.by_id.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        Ok(mutate(&mut slot.record))
    }

    /// Most recently started job for a task name
    ///
    /// Jobs that have not started yet sort before any started job. Ties
    /// (including several still-pending jobs) go to the one created last.
    pub fn latest_by_task_name(
        &self,
        task_name: &str,
    ) -> Result<(Uuid, JobRecord), RegistryError> {
        self.lock()
            .by_id
            .iter()
            .filter(|(_, slot)| slot.record.task_name == task_name)
            .max_by_key(|(_, slot)| (slot.record.started_at, slot.seq))
            .map(|(id, slot)| (*id, slot.record.clone()))
            .ok_or_else(|| RegistryError::NoJobsForTask(task_name.to_string()))
    }

    /// Number of jobs recorded since startup
    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Jobs> {
        // Every mutation is a plain field assignment, so a poisoned map is
        // still consistent.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
