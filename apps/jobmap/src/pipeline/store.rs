//! The batch of job records currently shown to readers.
//!
//! Records are addressed by identifier only. Background resolution finishes out of
//! order and may outlive the batch it was started for, so positions are never used
//! to target an update.

use std::sync::RwLock;

use tokio::sync::watch;

use crate::feed::JobRecord;
use crate::geo::Coordinates;

#[derive(Debug, Default)]
struct Batch {
    generation: u64,
    jobs: Vec<JobRecord>,
}

pub struct JobStore {
    batch: RwLock<Batch>,
    revision: watch::Sender<u64>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            batch: RwLock::new(Batch::default()),
            revision,
        }
    }

    /// Installs a new batch and publishes it. Returns the new generation.
    pub fn replace(&self, jobs: Vec<JobRecord>) -> u64 {
        let generation = {
            let mut batch = self.batch.write().unwrap_or_else(|e| e.into_inner());
            batch.generation += 1;
            batch.jobs = jobs;
            batch.generation
        };
        self.publish();
        generation
    }

    /// Sets the coordinates of the record with this identifier.
    ///
    /// Returns false, without touching anything, when the identifier is not in the
    /// current batch (it was replaced meanwhile) or the record is already located.
    pub fn set_coordinates(&self, id: &str, coords: Coordinates) -> bool {
        let mut batch = self.batch.write().unwrap_or_else(|e| e.into_inner());
        match batch.jobs.iter_mut().find(|j| j.id == id) {
            Some(job) if job.coordinates.is_none() => {
                job.coordinates = Some(coords);
                true
            }
            _ => false,
        }
    }

    /// Signals readers that the visible content changed.
    pub fn publish(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn generation(&self) -> u64 {
        self.read(|b| b.generation)
    }

    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.read(|b| b.jobs.clone())
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.read(|b| b.jobs.iter().find(|j| j.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.read(|b| b.jobs.len())
    }

    fn read<T>(&self, f: impl FnOnce(&Batch) -> T) -> T {
        let batch = self.batch.read().unwrap_or_else(|e| e.into_inner());
        f(&batch)
    }
}
