//! Error types for the fill cache

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CacheError {
    /// A filesystem operation on the cache tree failed
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    Config(String),
}

impl CacheError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Kind of the underlying I/O failure, if any
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            CacheError::Io { source, .. } => Some(source.kind()),
            CacheError::Config(_) => None,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io { op, path, source } => {
                write!(f, "IO error: failed to {} {}: {}", op, path.display(), source)
            }
            CacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            CacheError::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
