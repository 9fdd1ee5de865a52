// src/testutil.rs
// Shared helpers for tests that need a real HTTP server.
// Every test gets its own server on a random local port, so tests never touch
// the internet and can run in parallel.

use crate::config::FetchConfig;
use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;

// Starts `app` on 127.0.0.1 and returns its base URL (no trailing slash)
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

pub fn html(body: impl Into<String>) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body.into()))
        .unwrap()
}

// Fetch settings for local servers: short timeouts and no environment proxy
pub fn local_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout: std::time::Duration::from_secs(5),
        connect_timeout: std::time::Duration::from_secs(2),
        use_env_proxy: false,
        ..FetchConfig::default()
    }
}
