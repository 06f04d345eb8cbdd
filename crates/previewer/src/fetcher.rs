//! Remote image fetching

use crate::error::FetchError;
use axum::http::{HeaderMap, StatusCode};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "previewer/0.1";

/// Request headers that describe the client connection rather than the
/// request and must not be replayed upstream
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "accept-encoding",
];

/// Turn the `{*source}` part of a fill path into a URL.
///
/// Sources normally arrive without a scheme (`host[:port]/path`) and are
/// fetched over plain http; an explicit `http://` or `https://` is kept.
pub fn source_url(source: &str) -> Result<Url, FetchError> {
    let source = source.trim_start_matches('/');
    if source.is_empty() {
        return Err(FetchError::InvalidUrl("empty source".to_string()));
    }

    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        source.to_string()
    } else {
        format!("http://{}", source)
    };

    let url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{}: missing host", raw)));
    }
    Ok(url)
}

/// HTTP client for fetching source images
pub struct ImageFetcher {
    client: Client,
    max_bytes: u64,
}

impl ImageFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, max_bytes })
    }

    /// Fetch the image at `url`, replaying the client's `headers`
    pub async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Fetching source image");

        let mut response = self
            .client
            .get(url.clone())
            .headers(forwarded_headers(headers))
            .send()
            .await?;

        if let Err(e) = check_status(response.status()) {
            warn!(status = %response.status(), url = %url, "Failed to fetch source image");
            return Err(e);
        }

        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (data.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
            data.extend_from_slice(&chunk);
        }

        if !is_image(&data) {
            return Err(FetchError::NotAnImage);
        }

        debug!(url = %url, size = data.len(), "Fetched source image");
        Ok(data)
    }
}

fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::BAD_REQUEST => Err(FetchError::BadRequest),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        StatusCode::INTERNAL_SERVER_ERROR => Err(FetchError::UpstreamInternal),
        other => Err(FetchError::UnexpectedStatus(other.as_u16())),
    }
}

/// Sniff the body's magic bytes; the declared content type is not trusted
fn is_image(data: &[u8]) -> bool {
    image::guess_format(data).is_ok()
}
