use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::feed::rss::parse_rss;
use crate::feed::{FeedError, JobRecord, RawFeedItem};

/// Where raw feed items come from. The HTTP source is the production one.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError>;
}

pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_rss(&body)
    }
}

/// Fetches the feed and turns it into unresolved job records.
///
/// Never fails: a fetch or decode error is logged and yields an empty batch.
pub async fn ingest(source: &dyn FeedSource) -> Vec<JobRecord> {
    match source.fetch_items().await {
        Ok(items) => {
            let item_count = items.len();
            let jobs = build_batch(items);
            info!("Feed fetched: {} items, {} jobs", item_count, jobs.len());
            jobs
        }
        Err(e) => {
            error!("Failed to fetch job feed: {e}");
            Vec::new()
        }
    }
}

/// Parses every item. Items without an identifier are skipped; a repeated identifier
/// replaces the earlier record in place (last write wins, first position kept).
pub fn build_batch(items: Vec<RawFeedItem>) -> Vec<JobRecord> {
    let mut jobs: Vec<JobRecord> = Vec::with_capacity(items.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in items {
        let title = item.title.clone();
        let Some(job) = JobRecord::from_item(item) else {
            warn!("Skipping feed item without guid or link: \"{title}\"");
            continue;
        };

        match positions.get(&job.id) {
            Some(&idx) => jobs[idx] = job,
            None => {
                positions.insert(job.id.clone(), jobs.len());
                jobs.push(job);
            }
        }
    }

    jobs
}
