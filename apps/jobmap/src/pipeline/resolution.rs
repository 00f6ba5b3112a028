//! Two-pass coordinate resolution for a batch of job records.
//!
//! Pass 1 runs inline and only consults the commune index, so a batch can be shown
//! right away. Everything it could not place goes to pass 2: a single background
//! worker that runs the full resolver one record at a time. One request in flight
//! is the rate limit for the remote geocoder; do not parallelize this loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::feed::JobRecord;
use crate::geo::resolver::LocationResolver;
use crate::pipeline::store::JobStore;

/// A record left for the background pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub id: String,
    pub city: String,
    pub department: String,
}

impl PendingLookup {
    fn for_job(job: &JobRecord) -> Self {
        Self {
            id: job.id.clone(),
            city: job.city.clone(),
            department: job.department.clone(),
        }
    }
}

/// Pass 2 work for one generation of the job store.
#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub generation: u64,
    pub lookups: Vec<PendingLookup>,
}

/// Result of pass 1: the full batch (some records located) and what is left to do.
#[derive(Debug)]
pub struct LocalPass {
    pub jobs: Vec<JobRecord>,
    pub pending: Vec<PendingLookup>,
}

/// Pass 1. Records without any location hint stay unresolved and are not queued.
pub fn resolve_locally(mut jobs: Vec<JobRecord>, resolver: &LocationResolver) -> LocalPass {
    let mut pending = Vec::new();

    for job in jobs
        .iter_mut()
        .filter(|j| j.coordinates.is_none() && j.has_location_hint())
    {
        match resolver.resolve_local(&job.city, &job.department) {
            Some(coords) => job.coordinates = Some(coords),
            None => pending.push(PendingLookup::for_job(job)),
        }
    }

    LocalPass { jobs, pending }
}

/// Pass 2 for one batch. Returns how many records were updated.
///
/// Updates go to whatever batch the store holds now; an identifier that is no
/// longer there is dropped. The store publishes once, after the batch drains, if
/// anything changed.
pub async fn resolve_remaining(
    batch: PendingBatch,
    resolver: &LocationResolver,
    store: &JobStore,
) -> usize {
    let total = batch.lookups.len();
    let mut updated = 0;
    let mut unresolved = 0;

    for lookup in batch.lookups {
        let Some(coords) = resolver.resolve(&lookup.city, &lookup.department).await else {
            unresolved += 1;
            continue;
        };

        if store.set_coordinates(&lookup.id, coords) {
            updated += 1;
        } else {
            debug!(
                "Dropping coordinates for \"{}\": not in the current batch",
                lookup.id
            );
        }
    }

    if updated > 0 {
        store.publish();
    }

    info!(
        generation = batch.generation,
        "Background resolution done: {}/{} located, {} unresolved",
        updated,
        total,
        unresolved
    );

    updated
}

/// Sequential background queue for pass 2, drained by a single worker task.
#[derive(Clone)]
pub struct ResolutionQueue {
    tx: mpsc::UnboundedSender<PendingBatch>,
}

impl ResolutionQueue {
    pub fn spawn(resolver: Arc<LocationResolver>, store: Arc<JobStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PendingBatch>();

        let worker = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                resolve_remaining(batch, &resolver, &store).await;
            }
            debug!("Resolution queue closed");
        });

        (Self { tx }, worker)
    }

    /// Queues a batch. Empty batches are ignored.
    pub fn enqueue(&self, batch: PendingBatch) {
        if batch.lookups.is_empty() {
            return;
        }
        if self.tx.send(batch).is_err() {
            warn!("Resolution worker is gone; background lookups skipped");
        }
    }
}
