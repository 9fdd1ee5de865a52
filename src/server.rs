// src/server.rs
// =============================================================================
// The HTTP service: a thin adapter that maps requests onto the crawler.
//
// Routes:
//   GET  /health        -> {"status":"ok"}
//   POST /crawl         -> {"url": "..."}       one CrawlResult
//   POST /crawl/batch   -> {"urls": [...]}      outcomes in input order
//   POST /crawl/upload  -> multipart "file"     NDJSON, completion order
//
// Every handler owns a CancellationToken wrapped in a drop guard. If the
// client goes away, axum drops the handler (or the response stream), the
// guard cancels the token and in-flight fetches are aborted.
// =============================================================================

use crate::crawl::Crawler;
use crate::error::CrawlError;
use crate::input::{parse_urls, ListFormat};
use crate::models::{CrawlResult, Outcome};
use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

// Deadline for POST /crawl (batch tasks use the crawler's own task deadline)
const SINGLE_CRAWL_DEADLINE: Duration = Duration::from_secs(20);

// Largest accepted request body (uploaded URL lists included)
const MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    crawler: Crawler,
}

#[derive(Debug, Deserialize)]
struct CrawlRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    urls: Vec<String>,
}

// An error response: {"error": "..."} with a status code
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// Bad input -> 400, the remote site failed us -> 502, its content did -> 422
impl From<CrawlError> for ApiError {
    fn from(error: CrawlError) -> Self {
        let status = if error.is_input_error() {
            StatusCode::BAD_REQUEST
        } else if error.is_fetch_stage() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

pub fn router(crawler: Crawler) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crawl", post(crawl_single))
        .route("/crawl/batch", post(crawl_batch))
        .route("/crawl/upload", post(crawl_upload))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(
            // One INFO line per request: method, path, status and latency
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(AppState { crawler })
}

// Binds `addr` and serves until Ctrl-C or SIGTERM
pub async fn serve(addr: &str, crawler: Crawler) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot listen on {}", addr))?;

    info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, router(crawler))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("bye");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn crawl_single(
    State(state): State<AppState>,
    payload: Result<Json<CrawlRequest>, JsonRejection>,
) -> Result<Json<CrawlResult>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("invalid payload"))?;
    if request.url.trim().is_empty() {
        return Err(ApiError::bad_request("invalid payload"));
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = state
        .crawler
        .crawl_one(&request.url, SINGLE_CRAWL_DEADLINE, &cancel)
        .await?;

    Ok(Json(result))
}

async fn crawl_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<Vec<Outcome>>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("invalid payload"))?;
    if request.urls.is_empty() {
        return Err(ApiError::bad_request("invalid payload"));
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    Ok(Json(state.crawler.collect(request.urls, &cancel).await))
}

async fn crawl_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let (file_name, bytes) = read_file_part(&mut multipart).await?;
    let urls = parse_urls(&bytes, ListFormat::from_file_name(&file_name))
        .map_err(|e| ApiError::bad_request(format!("{:#}", e)))?;

    info!(file = %file_name, urls = urls.len(), "upload accepted");

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let lines = ReceiverStream::new(state.crawler.stream(urls, cancel)).map(move |outcome| {
        // The stream owns the guard: dropping the response body cancels the run
        let _guard = &guard;
        let mut line = serde_json::to_vec(&outcome)?;
        line.push(b'\n');
        Ok::<_, serde_json::Error>(line)
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}

// Finds the multipart field named "file" and returns (file name, contents)
async fn read_file_part(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("multipart parse error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("multipart parse error: {}", e)))?;

        return Ok((file_name, bytes));
    }

    Err(ApiError::bad_request("file part 'file' required"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::fetch::Fetcher;
    use crate::testutil::{html, local_fetch_config, serve as serve_app};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    const BOUNDARY: &str = "page-triage-test-boundary";

    async fn start_upstream() -> String {
        let app = Router::new()
            .route(
                "/product",
                get(|| async { html("<title>Shop</title><p>Only $5, buy now</p>") }),
            )
            .route(
                "/post",
                get(|| async { html("<title>My blog</title><p>Thoughts on gardening</p>") }),
            )
            .route(
                "/error",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
            )
            .route(
                "/json",
                get(|| async { Json(json!({ "not": "html" })) }),
            );

        serve_app(app).await
    }

    async fn start_service() -> String {
        let crawler = Crawler::new(
            Fetcher::new(&local_fetch_config()).unwrap(),
            &CrawlConfig::default().with_concurrency(4),
        );
        serve_app(router(crawler)).await
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    fn multipart_body(file_name: &str, contents: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            c = contents
        )
    }

    #[tokio::test]
    async fn test_health() {
        let service = start_service().await;
        let response = client().get(format!("{}/health", service)).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "status": "ok" }));
    }

    // Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_requests_are_logged_at_info() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        // Single-threaded test runtime: the server task logs on this thread
        let _default = tracing::subscriber::set_default(subscriber);

        let service = start_service().await;
        let response = client().get(format!("{}/health", service)).send().await.unwrap();
        assert_eq!(response.status(), 200);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("finished processing request"), "{}", output);
        assert!(output.contains("/health"), "{}", output);
    }

    #[tokio::test]
    async fn test_crawl_single() {
        let upstream = start_upstream().await;
        let service = start_service().await;

        let response = client()
            .post(format!("{}/crawl", service))
            .json(&json!({ "url": format!("{}/product", upstream) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["sourceUrl"], format!("{}/product", upstream));
        assert_eq!(body["class"]["label"], "product");
        assert_eq!(body["meta"]["title"], "Shop");
    }

    #[tokio::test]
    async fn test_crawl_single_error_statuses() {
        let upstream = start_upstream().await;
        let service = start_service().await;
        let cases: [(Value, u16); 5] = [
            (json!({ "nope": 1 }), 400),
            (json!({ "url": "" }), 400),
            (json!({ "url": "not a url" }), 400),
            (json!({ "url": format!("{}/error", upstream) }), 502),
            (json!({ "url": format!("{}/json", upstream) }), 502),
        ];

        for (payload, status) in cases {
            let response = client()
                .post(format!("{}/crawl", service))
                .json(&payload)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), status, "{}", payload);
            let body: Value = response.json().await.unwrap();
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let upstream = start_upstream().await;
        let service = start_service().await;
        let urls = vec![
            format!("{}/post", upstream),
            format!("{}/error", upstream),
            format!("{}/product", upstream),
        ];

        let response = client()
            .post(format!("{}/crawl/batch", service))
            .json(&json!({ "urls": urls }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Vec<Value> = response.json().await.unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body[0]["url"], urls[0]);
        assert_eq!(body[0]["result"]["class"]["label"], "blog");
        assert_eq!(body[1]["error"], "http status 500");
        assert!(body[1].get("result").is_none());
        assert_eq!(body[2]["result"]["class"]["label"], "product");
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_list() {
        let service = start_service().await;
        let response = client()
            .post(format!("{}/crawl/batch", service))
            .json(&json!({ "urls": [] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_upload_streams_ndjson() {
        let upstream = start_upstream().await;
        let service = start_service().await;
        let csv = format!("url\n{u}/product\n{u}/post\n{u}/error\n", u = upstream);

        let response = client()
            .post(format!("{}/crawl/upload", service))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body("urls.csv", &csv))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/x-ndjson"
        );

        let text = response.text().await.unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);

        let failed: Vec<&Value> = lines.iter().filter(|line| line.get("error").is_some()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0]["url"], format!("{}/error", upstream));
    }

    #[tokio::test]
    async fn test_upload_requires_file_part() {
        let service = start_service().await;
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{b}--\r\n",
            b = BOUNDARY
        );

        let response = client()
            .post(format!("{}/crawl/upload", service))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "file part 'file' required");
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_list() {
        let service = start_service().await;
        let response = client()
            .post(format!("{}/crawl/upload", service))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body("urls.csv", "link\nhttps://a.example\n"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}
