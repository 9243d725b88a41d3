//! Persisted user preferences
//!
//! Filter rules and the search configuration are stored as JSON blobs under
//! fixed names. Missing or unreadable blobs fall back to defaults; nothing
//! here stops the pipeline from running.

use crate::error::PersistError;
use crate::filter::FilterSet;
use crate::search::SearchConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Blob name for the saved filter rules
pub const FILTERS_KEY: &str = "netlens-filters";

/// Blob name for the saved search configuration
pub const SEARCH_CONFIG_KEY: &str = "netlens-search-config";

/// Named string blobs
pub trait BlobStore {
    fn load(&self, name: &str) -> Result<Option<String>, PersistError>;
    fn save(&self, name: &str, blob: &str) -> Result<(), PersistError>;
    fn remove(&self, name: &str) -> Result<(), PersistError>;
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, name: &str) -> Result<Option<String>, PersistError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| PersistError::Backend(e.to_string()))?;
        Ok(blobs.get(name).cloned())
    }

    fn save(&self, name: &str, blob: &str) -> Result<(), PersistError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| PersistError::Backend(e.to_string()))?;
        blobs.insert(name.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), PersistError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| PersistError::Backend(e.to_string()))?;
        blobs.remove(name);
        Ok(())
    }
}

/// Read and parse one blob; `None` when it was never saved
pub fn load_blob<T, B>(store: &B, name: &str) -> Result<Option<T>, PersistError>
where
    T: DeserializeOwned,
    B: BlobStore + ?Sized,
{
    let Some(raw) = store.load(name)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistError::Deserialize {
            name: name.to_string(),
            source,
        })
}

/// Serialize and write one blob
pub fn save_blob<T, B>(store: &B, name: &str, value: &T) -> Result<(), PersistError>
where
    T: Serialize,
    B: BlobStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| PersistError::Serialize {
        name: name.to_string(),
        source,
    })?;
    store.save(name, &raw)
}

/// Everything the user configures between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub filters: FilterSet,
    pub search: SearchConfig,
}

impl Preferences {
    /// Load both blobs, substituting defaults for anything missing or corrupt
    pub fn load<B: BlobStore + ?Sized>(store: &B) -> Self {
        Self {
            filters: load_or_default(store, FILTERS_KEY),
            search: load_or_default(store, SEARCH_CONFIG_KEY),
        }
    }

    pub fn save<B: BlobStore + ?Sized>(&self, store: &B) -> Result<(), PersistError> {
        save_blob(store, FILTERS_KEY, &self.filters)?;
        save_blob(store, SEARCH_CONFIG_KEY, &self.search)?;
        tracing::debug!("Saved {} filters and search config", self.filters.len());
        Ok(())
    }
}

fn load_or_default<T, B>(store: &B, name: &str) -> T
where
    T: DeserializeOwned + Default,
    B: BlobStore + ?Sized,
{
    match load_blob(store, name) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("Ignoring saved preferences: {}", e);
            T::default()
        }
    }
}
