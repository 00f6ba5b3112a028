//! Geocode cache: exact query string → coordinates, persisted as a JSON file.
//!
//! The cache is an optimization only: a missing or corrupt file loads as empty, and
//! failed writes are swallowed. Writes to the file are serialized and always carry
//! the full current map, so the file never loses an entry to an older snapshot.
//! They block; async callers go through `spawn_blocking`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{debug, info, warn};

use crate::geo::Coordinates;

pub struct GeocodeCache {
    entries: RwLock<HashMap<String, Coordinates>>,
    path: Option<PathBuf>,
    /// Held from the map update through the file write.
    write_lock: Mutex<()>,
}

impl GeocodeCache {
    /// Cache that lives in memory only.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the cache file at `path`, tolerating a missing or unreadable file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        if !entries.is_empty() {
            info!("Geocode cache loaded: {} entries", entries.len());
        }
        Self {
            entries: RwLock::new(entries),
            path: Some(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Whether inserts touch the filesystem.
    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub fn get(&self, query: &str) -> Option<Coordinates> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(query).copied())
    }

    /// Stores an entry and persists the whole cache. Returns true if the query was new.
    pub fn insert(&self, query: &str, coords: Coordinates) -> bool {
        let _writing = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot = {
            let Ok(mut entries) = self.entries.write() else {
                return false;
            };
            let is_new = entries.insert(query.to_string(), coords).is_none();
            if !is_new {
                return false;
            }
            entries.clone()
        };

        self.persist(&snapshot);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    fn persist(&self, entries: &HashMap<String, Coordinates>) {
        let Some(path) = &self.path else {
            return;
        };

        // Write then rename, so a reader never sees a half-written file.
        let tmp = path.with_extension("json.tmp");
        let result = serde_json::to_vec(entries)
            .map_err(std::io::Error::from)
            .and_then(|bytes| std::fs::write(&tmp, bytes))
            .and_then(|()| std::fs::rename(&tmp, path));

        if let Err(e) = result {
            debug!("Could not persist geocode cache to {}: {e}", path.display());
        }
    }
}

fn read_entries(path: &Path) -> HashMap<String, Coordinates> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return HashMap::new(),
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!(
            "Ignoring unreadable geocode cache {}: {e}",
            path.display()
        );
        HashMap::new()
    })
}
