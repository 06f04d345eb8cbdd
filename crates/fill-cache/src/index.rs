//! In-memory recency index
//!
//! Tracks which keys are cached, where their blobs live, and the order in
//! which they were last used. The index never touches the disk and never
//! evicts on its own: the caller removes the tail's blob first and then pops
//! it, so a failed delete leaves the index unchanged.

use crate::key::CacheKey;
use crate::types::CacheEntry;
use lru::LruCache;
use std::num::NonZeroUsize;

pub struct LruIndex {
    entries: LruCache<CacheKey, CacheEntry>,
    capacity: NonZeroUsize,
    total_size: u64,
}

impl LruIndex {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity,
            total_size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when inserting a new key requires an eviction first
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity.get()
    }

    /// Sum of the sizes of all indexed blobs
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Look up `key` and mark it most recently used
    pub fn touch(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Look up `key` without changing its recency
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// The entry that would be evicted next
    pub fn least_recent(&self) -> Option<&CacheEntry> {
        self.entries.peek_lru().map(|(_, entry)| entry)
    }

    pub fn pop_least_recent(&mut self) -> Option<CacheEntry> {
        let (_, entry) = self.entries.pop_lru()?;
        self.total_size -= entry.size;
        Some(entry)
    }

    /// Insert or replace an entry at the most recently used position.
    /// Returns the entry previously stored under the same key.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.total_size += entry.size;
        let previous = self.entries.put(entry.key.clone(), entry);
        if let Some(ref old) = previous {
            self.total_size -= old.size;
        }
        previous
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.total_size -= entry.size;
        Some(entry)
    }

    /// Keys ordered from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }
}
