//! Core types for the previewer service

use axum::http::HeaderMap;
use fill_cache::{CacheConfig, CacheStats, DEFAULT_SHARD_DEPTH};
use serde::Serialize;
use std::path::PathBuf;
use url::Url;

/// Configuration for the previewer
#[derive(Debug, Clone)]
pub struct PreviewerConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub cache_capacity: usize,
    pub cache_shard_depth: usize,
    pub upstream_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_image_bytes: u64,
}

impl PreviewerConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            base_dir: self.cache_dir.clone(),
            capacity: self.cache_capacity,
            shard_depth: self.cache_shard_depth,
        }
    }
}

impl Default for PreviewerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cache_dir: PathBuf::from("./cache/previews"),
            cache_capacity: 1000,
            cache_shard_depth: DEFAULT_SHARD_DEPTH,
            upstream_timeout_secs: 10,
            request_timeout_secs: 30,
            max_image_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

/// A request to fill `url`'s image into `width` x `height`
#[derive(Debug, Clone)]
pub struct FillCommand {
    pub url: Url,
    pub width: u32,
    pub height: u32,
    /// Client request headers, forwarded upstream
    pub headers: HeaderMap,
}

/// Encoded JPEG produced for a fill request
#[derive(Debug)]
pub struct Filled {
    pub data: Vec<u8>,
    pub from_cache: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
