use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::feed::{ingest, FeedSource};
use crate::geo::resolver::LocationResolver;
use crate::pipeline::resolution::{resolve_locally, LocalPass, PendingBatch, ResolutionQueue};
use crate::pipeline::store::JobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub generation: u64,
    pub total: usize,
    pub resolved_locally: usize,
    pub queued: usize,
}

/// Fetches the feed, resolves what it can locally, publishes, and hands the rest
/// to the background queue.
pub struct Refresher {
    feed: Arc<dyn FeedSource>,
    resolver: Arc<LocationResolver>,
    store: Arc<JobStore>,
    queue: ResolutionQueue,
}

impl Refresher {
    /// Must be called from within a tokio runtime: spawns the resolution worker.
    pub fn new(
        feed: Arc<dyn FeedSource>,
        resolver: Arc<LocationResolver>,
        store: Arc<JobStore>,
    ) -> Self {
        let (queue, _worker) = ResolutionQueue::spawn(resolver.clone(), store.clone());
        Self {
            feed,
            resolver,
            store,
            queue,
        }
    }

    pub async fn refresh_once(&self) -> RefreshReport {
        // The commune index is needed by pass 1; fetch it alongside the feed.
        let (jobs, ()) = tokio::join!(ingest(self.feed.as_ref()), self.resolver.index().load());

        let LocalPass { jobs, pending } = resolve_locally(jobs, &self.resolver);
        let total = jobs.len();
        let resolved_locally = jobs.iter().filter(|j| j.coordinates.is_some()).count();
        let queued = pending.len();

        let generation = self.store.replace(jobs);
        self.queue.enqueue(PendingBatch {
            generation,
            lookups: pending,
        });

        let report = RefreshReport {
            generation,
            total,
            resolved_locally,
            queued,
        };
        info!(
            "Refresh #{}: {} jobs, {} located locally, {} queued for background resolution",
            report.generation, report.total, report.resolved_locally, report.queued
        );
        report
    }

    /// Refreshes immediately, then every `interval`. A refresh may overlap the
    /// background pass of the previous one; its stale updates are dropped by the store.
    pub fn spawn_loop(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::client::tests::{raw, StaticFeed};
    use crate::geo::city_index::tests::{sample_communes, StaticCommunes};
    use crate::geo::city_index::CityIndex;
    use crate::geo::geocoder::tests::{geocoder, hit, CountingBackend};
    use crate::geo::{departments, Coordinates};

    struct Fixture {
        feed: Arc<StaticFeed>,
        communes: Arc<StaticCommunes>,
        backend: Arc<CountingBackend>,
        store: Arc<JobStore>,
        refresher: Arc<Refresher>,
    }

    fn fixture() -> Fixture {
        let feed = Arc::new(StaticFeed::new(vec![
            raw("paris", "[CDI] Développeur SIG - Paris (75)"),
            raw("finistere", "[Stage] Cartographe (29)"),
            raw("quimperle", "[CDD] Analyste - Quimperlé"),
            raw("vague", "Stage cartographie"),
        ]));
        let communes = Arc::new(StaticCommunes::new(sample_communes()));
        let backend = Arc::new(CountingBackend::returning(vec![hit("47.87", "-3.55")]));
        let index = Arc::new(CityIndex::new(communes.clone()));
        let resolver = Arc::new(LocationResolver::standard(
            index,
            Arc::new(geocoder(backend.clone())),
        ));
        let store = Arc::new(JobStore::new());
        let refresher = Arc::new(Refresher::new(feed.clone(), resolver, store.clone()));

        Fixture {
            feed,
            communes,
            backend,
            store,
            refresher,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_local_pass_then_background_results() {
        let fx = fixture();

        let report = fx.refresher.refresh_once().await;
        assert_eq!(
            report,
            RefreshReport {
                generation: 1,
                total: 4,
                resolved_locally: 1,
                queued: 2,
            }
        );
        assert!(fx.store.get("paris").unwrap().coordinates.is_some());
        assert!(fx.store.get("finistere").unwrap().coordinates.is_none());

        let mut rx = fx.store.subscribe();
        tokio::time::timeout(Duration::from_secs(10), rx.changed())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            fx.store.get("finistere").unwrap().coordinates,
            Some(departments::find("29").unwrap().centroid)
        );
        assert_eq!(
            fx.store.get("quimperle").unwrap().coordinates,
            Some(Coordinates::new(47.87, -3.55))
        );
        assert_eq!(fx.store.get("vague").unwrap().coordinates, None);
        assert_eq!(fx.backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_loaded_once_across_refreshes() {
        let fx = fixture();
        fx.refresher.refresh_once().await;
        fx.refresher.refresh_once().await;
        assert_eq!(
            fx.communes.calls.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
        assert_eq!(fx.store.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_failure_degrades_to_no_jobs() {
        let fx = fixture();
        fx.refresher.refresh_once().await;
        *fx.feed.items.lock().unwrap() = Err(());

        let report = fx.refresher.refresh_once().await;

        assert_eq!(report.total, 0);
        assert_eq!(fx.store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_refreshes_on_interval() {
        let fx = fixture();
        let _handle = fx.refresher.clone().spawn_loop(Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fx.store.generation(), 1);
        assert_eq!(fx.store.len(), 4);

        fx.feed.replace(vec![raw("lyon", "[CDI] Géomaticien - Lyon (69)")]);
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(fx.store.generation(), 2);
        let jobs = fx.store.snapshot();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "lyon");
        assert!(jobs[0].coordinates.is_some());
    }
}
