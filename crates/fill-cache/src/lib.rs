//! Disk-backed LRU cache for resized images
//!
//! Stores encoded images on disk in a sharded directory tree, tracks them in
//! an in-memory recency index, and evicts the least recently used image once
//! the configured number of entries is reached.

mod cache;
mod error;
mod index;
mod key;
mod shard;
mod store;
mod types;

pub use cache::DiskLruCache;
pub use error::{CacheError, Result};
pub use index::LruIndex;
pub use key::{CacheKey, KEY_LEN};
pub use shard::{ShardResolver, DEFAULT_SHARD_DEPTH, MAX_SHARD_DEPTH};
pub use types::{CacheConfig, CacheEntry, CacheStats};
