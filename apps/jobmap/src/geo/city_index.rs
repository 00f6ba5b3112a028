//! In-memory commune lookup built once from the national commune dataset.
//!
//! Lifecycle: unloaded → loading (one in-flight load, shared by concurrent callers)
//! → loaded for the rest of the process. A failed load leaves the index unloaded;
//! every lookup then misses and the resolver falls through to its later tiers.
//! The next `load()` call tries again.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::geo::normalize::normalize_key;
use crate::geo::{Coordinates, GeoError};

/// A commune as served by the dataset. Source coordinates are `[lon, lat]`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommuneRecord {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "codeDepartement", default)]
    pub department_code: String,
    #[serde(default)]
    pub centre: Option<PointGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointGeometry {
    pub coordinates: [f64; 2],
}

/// A commune ready for lookup, coordinates already converted to `(lat, lon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommuneEntry {
    pub name: String,
    pub department_code: String,
    pub coordinates: Coordinates,
}

impl CommuneRecord {
    /// Drops records without a point geometry.
    fn into_entry(self) -> Option<CommuneEntry> {
        let centre = self.centre?;
        Some(CommuneEntry {
            name: self.name,
            department_code: self.department_code,
            coordinates: Coordinates::from_lon_lat(centre.coordinates),
        })
    }
}

/// Where the commune dataset comes from. The HTTP source is the production one.
#[async_trait]
pub trait CommuneSource: Send + Sync {
    async fn fetch_communes(&self) -> Result<Vec<CommuneRecord>, GeoError>;
}

pub struct HttpCommuneSource {
    client: Client,
    url: String,
}

impl HttpCommuneSource {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl CommuneSource for HttpCommuneSource {
    async fn fetch_communes(&self) -> Result<Vec<CommuneRecord>, GeoError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status {
                service: "commune dataset",
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Vec<CommuneRecord>>().await?)
    }
}

/// normalized name → every commune sharing it, in dataset order.
type CityTable = HashMap<String, Vec<CommuneEntry>>;

pub struct CityIndex {
    source: Arc<dyn CommuneSource>,
    table: OnceCell<CityTable>,
}

impl CityIndex {
    pub fn new(source: Arc<dyn CommuneSource>) -> Self {
        Self {
            source,
            table: OnceCell::new(),
        }
    }

    /// Loads the dataset unless already loaded. Concurrent callers wait on the same load.
    /// Failures are logged and leave the index unloaded.
    pub async fn load(&self) {
        let result = self
            .table
            .get_or_try_init(|| async {
                info!("Downloading commune dataset...");
                let records = self.source.fetch_communes().await?;
                let total = records.len();
                let table = build_table(records);
                info!(
                    "Commune dataset loaded: {} communes, {} distinct names",
                    total,
                    table.len()
                );
                Ok::<_, GeoError>(table)
            })
            .await;

        if let Err(e) = result {
            warn!("Failed to load commune dataset: {e}");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.initialized()
    }

    /// Number of indexed communes (0 while unloaded).
    pub fn len(&self) -> usize {
        self.table
            .get()
            .map(|t| t.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Finds a commune by name.
    ///
    /// With a department code, only a commune of that department is returned; there is
    /// no fallback to a namesake elsewhere. Without one, the first commune of that name
    /// in dataset order wins. That is a known approximation for ambiguous names
    /// (there are dozens of "Saint-Martin").
    pub fn lookup(&self, city: &str, department: Option<&str>) -> Option<Coordinates> {
        let table = self.table.get()?;
        if city.trim().is_empty() {
            return None;
        }

        let bucket = table.get(&normalize_key(city))?;

        match department.filter(|d| !d.is_empty()) {
            Some(code) => bucket
                .iter()
                .find(|e| e.department_code == code)
                .map(|e| e.coordinates),
            None => bucket.first().map(|e| e.coordinates),
        }
    }
}

fn build_table(records: Vec<CommuneRecord>) -> CityTable {
    let mut table = CityTable::new();
    for entry in records.into_iter().filter_map(CommuneRecord::into_entry) {
        table
            .entry(normalize_key(&entry.name))
            .or_default()
            .push(entry);
    }
    table
}
