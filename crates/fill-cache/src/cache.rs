//! Disk-backed LRU cache of resized images

use crate::error::{CacheError, Result};
use crate::index::LruIndex;
use crate::key::CacheKey;
use crate::shard::ShardResolver;
use crate::store;
use crate::types::{CacheConfig, CacheEntry, CacheStats};
use chrono::Utc;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const WRITE_PROBE: &str = ".write-probe";

/// A bounded cache of encoded images keyed by `(source, width, height)`.
///
/// Every `get` and `set` holds one lock for its whole duration, including the
/// file I/O, so operations never interleave and the recency order always
/// matches completion order.
pub struct DiskLruCache {
    index: Mutex<LruIndex>,
    shards: ShardResolver,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl DiskLruCache {
    /// Open a cache rooted at `config.base_dir`.
    ///
    /// Fails with a configuration error when the capacity is zero, the shard
    /// depth is out of range, or the directory cannot be created or written.
    /// Blobs left by a previous process are unreachable from the fresh index
    /// and are deleted.
    pub async fn open(config: CacheConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.capacity)
            .ok_or_else(|| CacheError::Config("cache capacity must be positive".to_string()))?;
        let shards = ShardResolver::new(config.base_dir, config.shard_depth)?;

        check_writable(shards.base_dir()).await?;
        let swept = shards.sweep_orphans().await?;

        info!(
            cache_dir = ?shards.base_dir(),
            capacity = capacity.get(),
            shard_depth = shards.depth(),
            swept,
            "Cache initialized"
        );

        Ok(Self {
            index: Mutex::new(LruIndex::new(capacity)),
            shards,
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// Get the image stored for `source` at `width` x `height`.
    ///
    /// Returns `Ok(None)` on a miss. A hit becomes the most recently used
    /// entry. An indexed entry whose file is missing, unreadable or truncated
    /// is evicted and reported as a miss. Only a successful read changes the
    /// recency order.
    pub async fn get(&self, source: &str, width: u32, height: u32) -> Result<Option<Vec<u8>>> {
        let key = CacheKey::derive(source, width, height);
        let mut index = self.index.lock().await;

        let (path, expected_size) = match index.peek(&key) {
            Some(entry) => (entry.path.clone(), entry.size),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, source, width, height, "Cache miss");
                return Ok(None);
            }
        };

        match store::read(&path).await {
            Ok(data) if data.len() as u64 == expected_size => {
                index.touch(&key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, source, width, height, "Cache hit");
                return Ok(Some(data));
            }
            Ok(data) => {
                warn!(
                    key = %key,
                    expected_size,
                    actual_size = data.len(),
                    "Cached file has unexpected size, removing entry"
                );
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached file, removing entry");
            }
        }

        store::remove(&path).await?;
        index.remove(&key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    /// Store the image for `source` at `width` x `height` as the most
    /// recently used entry.
    ///
    /// Replacing an existing key keeps the entry count. Inserting a new key
    /// into a full cache first deletes the least recently used blob; if that
    /// delete fails the error is returned and nothing changes.
    pub async fn set(&self, source: &str, width: u32, height: u32, data: &[u8]) -> Result<()> {
        let key = CacheKey::derive(source, width, height);
        let mut index = self.index.lock().await;

        let replacing = index.contains(&key);
        if !replacing && index.is_full() {
            self.evict_least_recent(&mut index).await?;
        }

        let path = self.shards.resolve(&key);
        self.shards.ensure_shard(&path).await?;
        store::write(&path, data).await?;

        let size = data.len() as u64;
        index.insert(CacheEntry {
            key: key.clone(),
            source: source.to_string(),
            width,
            height,
            path,
            size,
            stored_at: Utc::now(),
        });

        debug!(key = %key, source, width, height, size, replacing, "Cached image");
        Ok(())
    }

    async fn evict_least_recent(&self, index: &mut LruIndex) -> Result<()> {
        let Some(victim) = index.least_recent().cloned() else {
            return Ok(());
        };

        store::remove(&victim.path).await?;
        index.pop_least_recent();
        self.evictions.fetch_add(1, Ordering::Relaxed);

        debug!(
            key = %victim.key,
            source = %victim.source,
            width = victim.width,
            height = victim.height,
            "Evicted least recently used entry"
        );
        Ok(())
    }

    /// Whether an image is cached for the triple. Does not affect recency.
    pub async fn contains(&self, source: &str, width: u32, height: u32) -> bool {
        let key = CacheKey::derive(source, width, height);
        self.index.lock().await.contains(&key)
    }

    /// Cached keys from most to least recently used
    pub async fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.index.lock().await.keys_by_recency()
    }

    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.lock().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Path the blob for the triple is (or would be) stored at
    pub fn path_of(&self, source: &str, width: u32, height: u32) -> PathBuf {
        self.shards.resolve(&CacheKey::derive(source, width, height))
    }

    pub fn base_dir(&self) -> &Path {
        self.shards.base_dir()
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let index = self.index.lock().await;
        CacheStats {
            entries: index.len(),
            capacity: index.capacity(),
            total_size: index.total_size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Create `dir` and prove a blob can be written into it
async fn check_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await.map_err(|e| {
        CacheError::Config(format!(
            "cannot create cache directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let probe = dir.join(WRITE_PROBE);
    let result = match store::write(&probe, b"ok").await {
        Ok(()) => store::remove(&probe).await,
        Err(e) => Err(e),
    };
    result.map_err(|e| {
        CacheError::Config(format!(
            "cache directory {} is not writable: {}",
            dir.display(),
            e
        ))
    })
}
