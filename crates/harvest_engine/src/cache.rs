use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use harvest_logging::harvest_warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::{VideoRecord, VideoStub};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Durable two-tier cache keyed by channel handle. A missing or corrupt
/// entry reads as absent, never as an error; writes replace the whole
/// per-channel collection.
pub trait HarvestStore: Send + Sync {
    /// Enumerated upload listing for a channel, if one was persisted.
    fn load_discovery(&self, handle: &str) -> Option<Vec<VideoStub>>;
    fn save_discovery(&self, handle: &str, stubs: &[VideoStub]) -> Result<(), CacheError>;
    /// Fully enriched records for a channel. Presence short-circuits the
    /// whole per-video enrichment loop on a later run.
    fn load_processed(&self, handle: &str) -> Option<Vec<VideoRecord>>;
    fn checkpoint_processed(&self, handle: &str, records: &[VideoRecord])
        -> Result<(), CacheError>;
}

/// Filesystem-backed [`HarvestStore`]: one JSON document per channel and
/// tier, written atomically.
pub struct HarvestCache {
    dir: PathBuf,
}

impl HarvestCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn discovery_path(&self, handle: &str) -> PathBuf {
        self.dir
            .join(format!("{}_videos_list.json", handle.trim_start_matches('@')))
    }

    fn processed_path(&self, handle: &str) -> PathBuf {
        self.dir
            .join(format!("{}_videos.json", handle.trim_start_matches('@')))
    }

    fn write_entry<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(value)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        AtomicFileWriter::new(self.dir.clone()).write(&filename, &content)?;
        Ok(())
    }
}

/// Decode-then-validate read: a missing file is a plain miss, anything
/// unreadable or undeserializable is logged and treated as a miss so the
/// run re-fetches instead of failing.
fn read_entry<T: DeserializeOwned>(path: &Path, handle: &str, tier: &str) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            harvest_warn!("Failed to read {tier} cache for {handle} at {path:?}: {err}");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            harvest_warn!("Corrupt {tier} cache for {handle} at {path:?}, will re-fetch: {err}");
            None
        }
    }
}

impl HarvestStore for HarvestCache {
    fn load_discovery(&self, handle: &str) -> Option<Vec<VideoStub>> {
        read_entry(&self.discovery_path(handle), handle, "discovery")
    }

    fn save_discovery(&self, handle: &str, stubs: &[VideoStub]) -> Result<(), CacheError> {
        self.write_entry(&self.discovery_path(handle), &stubs)
    }

    fn load_processed(&self, handle: &str) -> Option<Vec<VideoRecord>> {
        read_entry(&self.processed_path(handle), handle, "processed")
    }

    fn checkpoint_processed(
        &self,
        handle: &str,
        records: &[VideoRecord],
    ) -> Result<(), CacheError> {
        self.write_entry(&self.processed_path(handle), &records)
    }
}
