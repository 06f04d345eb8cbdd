//! Sharded on-disk layout
//!
//! A key `a1b2c3...` stored with depth 3 lives at `base/a/1/b/a1b2c3...`.
//! Nesting on the leading characters keeps every directory small no matter
//! how many entries the cache holds.

use crate::error::{CacheError, Result};
use crate::key::CacheKey;
use crate::store::{self, TMP_SUFFIX};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const DEFAULT_SHARD_DEPTH: usize = 3;
pub const MAX_SHARD_DEPTH: usize = 16;

/// Maps cache keys to file paths under a base directory
#[derive(Debug, Clone)]
pub struct ShardResolver {
    base_dir: PathBuf,
    depth: usize,
}

impl ShardResolver {
    pub fn new(base_dir: impl Into<PathBuf>, depth: usize) -> Result<Self> {
        if !(1..=MAX_SHARD_DEPTH).contains(&depth) {
            return Err(CacheError::Config(format!(
                "shard depth must be between 1 and {}, got {}",
                MAX_SHARD_DEPTH, depth
            )));
        }

        Ok(Self {
            base_dir: base_dir.into(),
            depth,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Directory that holds the blob for `key`
    pub fn shard_dir(&self, key: &CacheKey) -> PathBuf {
        let key = key.as_str();
        let mut dir = self.base_dir.clone();
        for i in 0..self.depth {
            dir.push(&key[i..i + 1]);
        }
        dir
    }

    /// Full path of the blob for `key`
    pub fn resolve(&self, key: &CacheKey) -> PathBuf {
        self.shard_dir(key).join(key.as_str())
    }

    /// Create the directories leading to `path` if they do not exist yet
    pub async fn ensure_shard(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| CacheError::io("create shard directory", parent, err))?;
        }
        Ok(())
    }

    /// Delete blobs and scratch files left in the tree by an earlier process.
    ///
    /// Blobs written with any shard depth are found, so changing the depth
    /// between runs does not strand old files. A file is only touched when its
    /// name is a key and the shard directories above it spell a prefix of that
    /// key; anything else under the base directory is left alone. Shard
    /// directories emptied by the sweep are removed. Returns the number of
    /// files deleted.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        let mut removed = 0;
        let mut visited = Vec::new();
        let mut pending = vec![(self.base_dir.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(CacheError::io("read directory", &dir, err)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|err| CacheError::io("read directory", &dir, err))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|err| CacheError::io("inspect", &path, err))?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };

                if file_type.is_dir() {
                    if prefix.len() < MAX_SHARD_DEPTH && is_shard_segment(name) {
                        pending.push((path, format!("{}{}", prefix, name)));
                    }
                } else if file_type.is_file() && is_own_blob(&prefix, name) {
                    store::remove(&path).await?;
                    removed += 1;
                }
            }

            if !prefix.is_empty() {
                visited.push(dir);
            }
        }

        // Children were pushed after their parents
        for dir in visited.iter().rev() {
            let mut entries = fs::read_dir(dir)
                .await
                .map_err(|err| CacheError::io("read directory", dir, err))?;
            let empty = entries
                .next_entry()
                .await
                .map_err(|err| CacheError::io("read directory", dir, err))?
                .is_none();
            if empty {
                fs::remove_dir(dir)
                    .await
                    .map_err(|err| CacheError::io("remove shard directory", dir, err))?;
            }
        }

        if removed > 0 {
            debug!(base_dir = ?self.base_dir, removed, "Swept orphaned cache files");
        }
        Ok(removed)
    }
}

/// Whether `name`, found under the shard directories spelling `prefix`, is a
/// blob or scratch file this cache wrote
fn is_own_blob(prefix: &str, name: &str) -> bool {
    let stem = name.strip_suffix(TMP_SUFFIX).unwrap_or(name);
    match CacheKey::parse(stem) {
        Some(key) => !prefix.is_empty() && key.as_str().starts_with(prefix),
        None => false,
    }
}

fn is_shard_segment(name: &str) -> bool {
    name.len() == 1 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
