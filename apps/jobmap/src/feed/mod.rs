// Feed ingestion: RSS download and decoding, then title parsing into job records.

pub mod client;
pub mod models;
pub mod rss;

use thiserror::Error;

pub use client::{ingest, FeedSource, HttpFeedSource};
pub use models::{JobRecord, RawFeedItem};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Document has no RSS channel")]
    MissingChannel,
}
