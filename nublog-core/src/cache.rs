//! Content-addressed cache of compiled documents.
//!
//! Entries are keyed by file path and validated by a blake3 hash of the raw
//! source, so an entry is only ever served for the exact bytes it was
//! compiled from. Pipeline configuration is not part of the hash: changing it
//! means deleting the cache file.

use crate::models::CompiledDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Hex-encoded blake3 hash of the raw source
    pub content_hash: String,
    pub document: CompiledDocument,
}

#[derive(Serialize, Deserialize)]
struct CacheBlob {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentCache {
    entries: BTreeMap<String, CacheEntry>,
}

pub fn content_hash(raw: &str) -> String {
    blake3::hash(raw.as_bytes()).to_hex().to_string()
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted cache.
    ///
    /// A missing file is an empty cache. So is a file that cannot be decoded
    /// or was written by another cache version; those are logged.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No content cache at {:?}", path);
                return Ok(Self::new());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<CacheBlob>(&data) {
            Ok(blob) if blob.version == CACHE_VERSION => {
                debug!("Loaded {} cache entries from {:?}", blob.entries.len(), path);
                Ok(Self {
                    entries: blob.entries,
                })
            }
            Ok(blob) => {
                warn!(
                    "Ignoring content cache {:?}: version {} (expected {})",
                    path, blob.version, CACHE_VERSION
                );
                Ok(Self::new())
            }
            Err(err) => {
                warn!("Failed to parse content cache {:?}: {}", path, err);
                Ok(Self::new())
            }
        }
    }

    /// Persist the whole cache, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = CacheBlob {
            version: CACHE_VERSION,
            entries: self.entries.clone(),
        };
        fs::write(path, serde_json::to_vec(&blob)?)?;
        debug!("Saved {} cache entries to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// The stored document for `file_path`, only if it was compiled from `raw`.
    pub fn get(&self, file_path: &str, raw: &str) -> Option<&CompiledDocument> {
        let entry = self.entries.get(file_path)?;
        (entry.content_hash == content_hash(raw)).then_some(&entry.document)
    }

    /// Store `document` as the output for `raw`, replacing any previous entry.
    pub fn set(&mut self, file_path: &str, raw: &str, document: CompiledDocument) {
        self.entries.insert(
            file_path.to_string(),
            CacheEntry {
                content_hash: content_hash(raw),
                document,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
