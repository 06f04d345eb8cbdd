//! HTTP server for previewer endpoints
//!
//! Provides /health and /fill/{width}/{height}/{*source}, with request
//! tracing, request ids and a per-request timeout.

use crate::error::{FetchError, PreviewerError};
use crate::fetcher::source_url;
use crate::service::Previewer;
use crate::types::{FillCommand, HealthResponse};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{error, info, info_span, warn, Level, Span};

/// Largest width or height a client may ask for
pub const MAX_DIMENSION: u32 = 4096;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state for the HTTP server
pub struct ServerState {
    pub previewer: Previewer,
    pub started_at: DateTime<Utc>,
    /// Requests running longer than this are answered with 408
    pub request_timeout: Duration,
}

impl ServerState {
    pub fn new(previewer: Previewer) -> Self {
        Self {
            previewer,
            started_at: Utc::now(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Create the HTTP router
///
/// Every request gets an `x-request-id` (kept if the client sent one), is
/// logged with its method, URI, status and latency, and is cut off after the
/// state's request timeout.
pub fn create_router(state: SharedState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health))
        .route("/fill/{width}/{height}/{*source}", get(fill))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> Span {
    info_span!(
        "request",
        request_id = header_str(request, REQUEST_ID_HEADER),
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        user_agent = header_str(request, header::USER_AGENT.as_str()),
    )
}

fn header_str<'a>(request: &'a Request<Body>, name: &str) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

/// Start the HTTP server and run it until Ctrl-C or SIGTERM
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping HTTP server");
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.previewer.cache().stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|value| (1..=MAX_DIMENSION).contains(value))
}

/// Fill the source image into the requested rectangle
async fn fill(
    State(state): State<SharedState>,
    Path((width, height, source)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let (Some(width), Some(height)) = (parse_dimension(&width), parse_dimension(&height)) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("width and height must be integers between 1 and {}", MAX_DIMENSION),
        );
    };

    let url = match source_url(&source) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let command = FillCommand {
        url,
        width,
        height,
        headers,
    };

    match state.previewer.fill(&command).await {
        Ok(filled) => {
            let cache_header = if filled.from_cache { "HIT" } else { "MISS" };
            (
                [
                    (header::CONTENT_TYPE, "image/jpeg"),
                    (header::CACHE_CONTROL, "public, max-age=86400"),
                    (HeaderName::from_static("x-cache"), cache_header),
                ],
                filled.data,
            )
                .into_response()
        }
        Err(e) => {
            warn!(source = %command.url, width, height, error = %e, "Failed to fill image");
            let status = status_for(&e);
            error_response(status, e.to_string())
        }
    }
}

fn status_for(err: &PreviewerError) -> StatusCode {
    match err {
        PreviewerError::Fetch(FetchError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
        PreviewerError::Fetch(_) | PreviewerError::Resize(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
