// src/config.rs
// =============================================================================
// Tuning knobs for the fetcher and the orchestrator.
//
// These are plain value types with sensible defaults. The CLI fills them in
// from flags (or PAGE_TRIAGE_* environment variables), and tests build them
// directly with struct update syntax: FetchConfig { max_body_bytes: 1024, ..Default::default() }
// =============================================================================

use std::time::Duration;

// 5 MiB: extraction never sees more than this many decoded bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

// Number of keywords attached to every CrawlResult
pub const DEFAULT_TOPIC_COUNT: usize = 15;

/// Connection-pool and per-request policy for the Fetcher.
///
/// These apply to the shared client, so they are set once at start-up and
/// never vary per call.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout (connect + headers + body)
    pub timeout: Duration,
    /// Connection establishment only; includes the TLS handshake
    pub connect_timeout: Duration,
    /// Bytes of decoded body kept; the rest is dropped silently
    pub max_body_bytes: usize,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub user_agent: String,
    /// Honour HTTP_PROXY / HTTPS_PROXY / NO_PROXY from the environment
    pub use_env_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            pool_max_idle_per_host: 100,
            pool_idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Duration::from_secs(30),
            user_agent: format!("page-triage/{}", env!("CARGO_PKG_VERSION")),
            use_env_proxy: true,
        }
    }
}

/// How a batch is fanned out
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of URLs in flight at once (always >= 1)
    pub concurrency: usize,
    /// Deadline for one URL's network phase
    pub task_timeout: Duration,
    pub topic_count: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            task_timeout: Duration::from_secs(25),
            topic_count: DEFAULT_TOPIC_COUNT,
        }
    }
}

impl CrawlConfig {
    // A zero concurrency would make the gate unusable, so clamp it.
    // The CLI already rejects 0; this covers callers that build the struct directly.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}
