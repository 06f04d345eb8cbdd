//! Shared fixtures for service and router tests

use crate::fetcher::ImageFetcher;
use crate::service::Previewer;
use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use fill_cache::{CacheConfig, DiskLruCache};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

pub const PRIVATE_TOKEN: &str = "Bearer secret";

/// Body limit of the fetcher built by `test_previewer`
pub const MAX_IMAGE_BYTES: u64 = 1024 * 1024;

/// How long `/slow.png` waits before answering
pub const SLOW_RESPONSE: Duration = Duration::from_secs(2);

pub fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Start a local image origin and return its `host:port`
pub async fn spawn_upstream() -> String {
    let public = test_png(80, 60);
    let private = test_png(80, 60);
    let slow = test_png(80, 60);
    let oversized = vec![0u8; MAX_IMAGE_BYTES as usize + 1];

    let app = Router::new()
        .route(
            "/img.png",
            get(move || {
                let body = public.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], body) }
            }),
        )
        .route(
            "/private.png",
            get(move |headers: HeaderMap| {
                let body = private.clone();
                async move {
                    let authorized = headers
                        .get(header::AUTHORIZATION)
                        .is_some_and(|value| value == PRIVATE_TOKEN);
                    if authorized {
                        ([(header::CONTENT_TYPE, "image/png")], body).into_response()
                    } else {
                        StatusCode::FORBIDDEN.into_response()
                    }
                }
            }),
        )
        .route("/text", get(|| async { "definitely not an image" }))
        .route(
            "/broken.png",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/slow.png",
            get(move || {
                let body = slow.clone();
                async move {
                    tokio::time::sleep(SLOW_RESPONSE).await;
                    ([(header::CONTENT_TYPE, "image/png")], body)
                }
            }),
        )
        // Announces its size with Content-Length
        .route(
            "/large.png",
            get(move || {
                let body = oversized.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], body) }
            }),
        )
        // Streamed in chunks with no Content-Length
        .route(
            "/large-chunked.png",
            get(|| async {
                let chunks = (0..20).map(|_| Ok::<_, std::io::Error>(vec![0u8; 64 * 1024]));
                Body::from_stream(futures_util::stream::iter(chunks))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

pub async fn test_previewer(cache_dir: &Path, capacity: usize) -> Previewer {
    let cache = DiskLruCache::open(CacheConfig::new(cache_dir, capacity))
        .await
        .unwrap();
    let fetcher = ImageFetcher::new(Duration::from_secs(5), MAX_IMAGE_BYTES).unwrap();
    Previewer::new(cache, fetcher)
}
