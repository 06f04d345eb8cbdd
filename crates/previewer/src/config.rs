//! Environment configuration

use crate::error::{PreviewerError, Result};
use crate::types::PreviewerConfig;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Load configuration from the process environment
pub fn load_config() -> Result<PreviewerConfig> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Build the configuration from `lookup`, falling back to defaults for
/// unset variables. Set but unparsable values are errors.
pub fn from_lookup<F>(lookup: F) -> Result<PreviewerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = PreviewerConfig::default();

    let cache_capacity = parse_var(&lookup, "CACHE_CAPACITY")?.unwrap_or(defaults.cache_capacity);
    if cache_capacity == 0 {
        return Err(PreviewerError::Config(
            "CACHE_CAPACITY must be positive".to_string(),
        ));
    }

    let upstream_timeout_secs =
        parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS")?.unwrap_or(defaults.upstream_timeout_secs);
    if upstream_timeout_secs == 0 {
        return Err(PreviewerError::Config(
            "UPSTREAM_TIMEOUT_SECS must be positive".to_string(),
        ));
    }

    let request_timeout_secs =
        parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(defaults.request_timeout_secs);
    if request_timeout_secs == 0 {
        return Err(PreviewerError::Config(
            "REQUEST_TIMEOUT_SECS must be positive".to_string(),
        ));
    }

    Ok(PreviewerConfig {
        port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
        cache_dir: lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir),
        cache_capacity,
        cache_shard_depth: parse_var(&lookup, "CACHE_SHARD_DEPTH")?
            .unwrap_or(defaults.cache_shard_depth),
        upstream_timeout_secs,
        request_timeout_secs,
        max_image_bytes: parse_var(&lookup, "MAX_IMAGE_BYTES")?
            .unwrap_or(defaults.max_image_bytes),
    })
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            PreviewerError::Config(format!("invalid {}={:?}: {}", name, raw, e))
        }),
    }
}
