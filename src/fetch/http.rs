// src/fetch/http.rs
// =============================================================================
// This module downloads pages over HTTP.
//
// Key functionality:
// - One reqwest Client for the whole process (connection pooling)
// - Makes a single GET per URL, no retries
// - Rejects bad status codes (outside 200..400) and non-HTML media types
// - Caps how much of the (already gunzipped) body we keep in memory
// - Every network await races against a CancellationToken
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Result<T, E>: Every failure is a typed CrawlError
// - tokio::select!: Wait for whichever of two futures finishes first
// =============================================================================

use crate::config::FetchConfig;
use crate::error::CrawlError;
use reqwest::{header, redirect, Client, Response};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// Media types the extractor knows how to read.
// An empty Content-Type is also accepted because plenty of servers omit it.
const ALLOWED_MEDIA_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

// Resolves URLs to HTML bytes.
//
// Clone is cheap: reqwest::Client is a reference-counted handle, so every
// task shares the same connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_body_bytes: usize,
}

// A response whose headers passed validation but whose body has not been read yet
#[derive(Debug)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: String,
    /// Raw Content-Type header ("" when absent)
    pub content_type: String,
    /// Time from the call to fetch() until the headers were validated
    pub elapsed: Duration,
    response: Response,
    max_body_bytes: usize,
}

impl Fetcher {
    // Builds the shared client.
    //
    // Proxy settings come from the environment (reqwest reads HTTP_PROXY,
    // HTTPS_PROXY and NO_PROXY itself) unless the config turns that off.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .redirect(redirect::Policy::limited(10));

        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            max_body_bytes: config.max_body_bytes,
        })
    }

    // Sends the request and validates the response headers.
    //
    // Returns as soon as the headers are in; call FetchedPage::read_body to
    // get the bytes. Dropping the FetchedPage instead closes the connection.
    pub async fn fetch(
        &self,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, CrawlError> {
        let start = Instant::now();
        let url = parse_url(raw_url)?;

        debug!(url = %url, "fetching");

        let request = self.client.get(url).header(header::ACCEPT, ACCEPT_HTML);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            result = request.send() => result?,
        };

        let status = response.status();
        if !(200..400).contains(&status.as_u16()) {
            debug!(url = raw_url, status = status.as_u16(), "rejected status");
            return Err(CrawlError::BadStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();
        check_content_type(&content_type)?;

        let final_url = response.url().to_string();
        let elapsed = start.elapsed();

        debug!(
            url = raw_url,
            final_url = %final_url,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "headers received"
        );

        Ok(FetchedPage {
            final_url,
            content_type,
            elapsed,
            response,
            max_body_bytes: self.max_body_bytes,
        })
    }
}

impl FetchedPage {
    // Reads the body up to the configured cap.
    //
    // Anything past the cap is dropped without an error; the response is
    // dropped when this returns, which releases the connection.
    pub async fn read_body(mut self, cancel: &CancellationToken) -> Result<Vec<u8>, CrawlError> {
        let mut body = Vec::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
                chunk = self.response.chunk() => chunk?,
            };

            let Some(chunk) = chunk else {
                break;
            };

            let room = self.max_body_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url = %self.final_url, cap = self.max_body_bytes, "body reached size cap");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

// Accepts only absolute URLs with both a scheme and a host
fn parse_url(raw_url: &str) -> Result<Url, CrawlError> {
    let url = Url::parse(raw_url.trim())
        .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", raw_url, e)))?;

    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return Err(CrawlError::InvalidUrl(format!("{}: missing host", raw_url)));
    }

    Ok(url)
}

// Checks the media type (the part before any ';' parameters)
fn check_content_type(content_type: &str) -> Result<(), CrawlError> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type.is_empty() || ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
        Ok(())
    } else {
        Err(CrawlError::UnsupportedContentType(media_type))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one shared Client?
//    - A Client owns a pool of open connections
//    - Reusing it means repeated requests to the same host skip the
//      TCP + TLS handshake
//    - Cloning a Client only bumps a reference count
//
// 2. What does `biased;` do in tokio::select!?
//    - Normally select! polls its branches in random order
//    - biased polls them top to bottom, so an already-cancelled token
//      always wins over a request that happens to be ready too
//
// 3. Why is read_body a separate step?
//    - The headers tell us whether the page is worth reading at all
//    - A JSON API or a 404 is rejected before we download its body
//
// 4. Where does gzip happen?
//    - reqwest's "gzip" feature decodes the stream for us when the server
//      sends Content-Encoding: gzip
//    - A corrupt stream shows up as a decode error while reading chunks
// -----------------------------------------------------------------------------
