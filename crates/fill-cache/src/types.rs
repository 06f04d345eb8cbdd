//! Cache types

use crate::key::CacheKey;
use crate::shard::DEFAULT_SHARD_DEPTH;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for a cached image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
    pub size: u64,
    pub stored_at: DateTime<Utc>,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Settings fixed when the cache is opened
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub base_dir: PathBuf,
    /// Maximum number of cached images
    pub capacity: usize,
    /// Number of single-character directory levels above each blob
    pub shard_depth: usize,
}

impl CacheConfig {
    pub fn new(base_dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            capacity,
            shard_depth: DEFAULT_SHARD_DEPTH,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("./cache/previews", 1000)
    }
}
