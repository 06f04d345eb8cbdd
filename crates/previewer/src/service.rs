//! Fill use case: cache lookup, fetch, resize, cache store

use crate::error::Result;
use crate::fetcher::ImageFetcher;
use crate::resizer;
use crate::types::{FillCommand, Filled};
use fill_cache::DiskLruCache;
use tracing::{error, info, warn};

pub struct Previewer {
    cache: DiskLruCache,
    fetcher: ImageFetcher,
}

impl Previewer {
    pub fn new(cache: DiskLruCache, fetcher: ImageFetcher) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &DiskLruCache {
        &self.cache
    }

    /// Produce the filled image for `command`, from cache when possible.
    ///
    /// Failing to store a freshly filled image is logged and does not fail
    /// the request.
    pub async fn fill(&self, command: &FillCommand) -> Result<Filled> {
        let source = command.url.as_str();
        let (width, height) = (command.width, command.height);

        match self.cache.get(source, width, height).await {
            Ok(Some(data)) => {
                info!(source, width, height, "Serving image from cache");
                return Ok(Filled {
                    data,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                error!(source, width, height, error = %e, "Cache lookup failed");
            }
        }

        let original = self.fetcher.fetch(&command.url, &command.headers).await?;
        info!(source, size = original.len(), "Fetched image from remote");

        let data = resizer::fill_blocking(original, width, height).await?;

        if let Err(e) = self.cache.set(source, width, height, &data).await {
            warn!(source, width, height, error = %e, "Failed to cache filled image");
        }

        Ok(Filled {
            data,
            from_cache: false,
        })
    }
}
