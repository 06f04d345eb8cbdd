//! Error types for the previewer service

use fill_cache::CacheError;
use std::fmt;

/// Why a remote image could not be fetched
#[derive(Debug)]
pub enum FetchError {
    Http(Box<reqwest::Error>),
    InvalidUrl(String),
    BadRequest,
    NotFound,
    UpstreamInternal,
    UnexpectedStatus(u16),
    TooLarge(u64),
    NotAnImage,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::InvalidUrl(msg) => write!(f, "Invalid source URL: {}", msg),
            FetchError::BadRequest => write!(f, "Upstream rejected the request"),
            FetchError::NotFound => write!(f, "Upstream image not found"),
            FetchError::UpstreamInternal => write!(f, "Upstream internal error"),
            FetchError::UnexpectedStatus(status) => {
                write!(f, "Upstream returned status {}", status)
            }
            FetchError::TooLarge(limit) => {
                write!(f, "Upstream image exceeds {} bytes", limit)
            }
            FetchError::NotAnImage => write!(f, "Upstream content is not an image"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

#[derive(Debug)]
pub enum PreviewerError {
    Cache(CacheError),
    Fetch(FetchError),
    Resize(String),
    Internal(String),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for PreviewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewerError::Cache(err) => write!(f, "Cache error: {}", err),
            PreviewerError::Fetch(err) => write!(f, "Fetch error: {}", err),
            PreviewerError::Resize(msg) => write!(f, "Resize error: {}", msg),
            PreviewerError::Internal(msg) => write!(f, "Internal error: {}", msg),
            PreviewerError::Io(err) => write!(f, "IO error: {}", err),
            PreviewerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PreviewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewerError::Cache(err) => Some(err),
            PreviewerError::Fetch(err) => Some(err),
            PreviewerError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<CacheError> for PreviewerError {
    fn from(err: CacheError) -> Self {
        PreviewerError::Cache(err)
    }
}

impl From<FetchError> for PreviewerError {
    fn from(err: FetchError) -> Self {
        PreviewerError::Fetch(err)
    }
}

impl From<std::io::Error> for PreviewerError {
    fn from(err: std::io::Error) -> Self {
        PreviewerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PreviewerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PreviewerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreviewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            format!("{}", FetchError::UnexpectedStatus(403)),
            "Upstream returned status 403"
        );
        assert_eq!(
            format!("{}", FetchError::NotAnImage),
            "Upstream content is not an image"
        );
        assert_eq!(
            format!("{}", PreviewerError::Fetch(FetchError::NotFound)),
            "Fetch error: Upstream image not found"
        );
    }

    #[test]
    fn test_cache_error_display() {
        let err = PreviewerError::from(CacheError::Config("capacity must be positive".into()));
        assert_eq!(
            format!("{}", err),
            "Cache error: Configuration error: capacity must be positive"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = PreviewerError::Config("invalid CACHE_CAPACITY".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid CACHE_CAPACITY");
    }

    #[test]
    fn test_error_is_debug() {
        let err = PreviewerError::Resize("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Resize"));
    }
}
