// src/crawl/pipeline.rs
// =============================================================================
// One URL's trip through the system:
//
//   fetch (network) -> extract (CPU) -> classify + topics (CPU)
//
// The stages always run in this order and a later stage never runs when an
// earlier one failed. Only the network phase is bounded by the deadline and
// the cancellation token; once the bytes are in memory, extraction and
// classification always finish.
// =============================================================================

use crate::classify::{classify, top_topics};
use crate::error::CrawlError;
use crate::extract::extract;
use crate::fetch::Fetcher;
use crate::models::{CrawlResult, Outcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// Everything the network phase hands to the CPU phase
struct Download {
    final_url: String,
    content_type: String,
    elapsed: Duration,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    topic_count: usize,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, topic_count: usize) -> Self {
        Self {
            fetcher,
            topic_count,
        }
    }

    // Runs every stage for `url`.
    //
    // Parameters:
    //   url: the URL as given by the caller
    //   deadline: upper bound for the network phase (request + body)
    //   cancel: aborts the network phase when cancelled
    pub async fn run(
        &self,
        url: &str,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        if url.trim().is_empty() {
            return Err(CrawlError::EmptyUrl);
        }

        let download = tokio::time::timeout(deadline, self.download(url, cancel))
            .await
            .map_err(|_| CrawlError::Timeout)??;

        let page = extract(&download.body, &download.content_type)?;
        let classification = classify(&page);
        let topics = top_topics(&page.content.text, self.topic_count);

        debug!(url, label = %classification.label, "classified");

        Ok(CrawlResult {
            source_url: download.final_url,
            fetch_ms: download.elapsed.as_millis() as u64,
            meta: page.meta,
            content: page.content,
            classification,
            topics,
        })
    }

    // Same as run(), but folds the error into the Outcome record
    pub async fn outcome(&self, url: String, deadline: Duration, cancel: &CancellationToken) -> Outcome {
        match self.run(&url, deadline, cancel).await {
            Ok(result) => Outcome::success(url, result),
            Err(e) => {
                warn!(url = %url, error = %e, "crawl failed");
                Outcome::failure(url, e)
            }
        }
    }

    async fn download(&self, url: &str, cancel: &CancellationToken) -> Result<Download, CrawlError> {
        let page = self.fetcher.fetch(url, cancel).await?;
        let final_url = page.final_url.clone();
        let content_type = page.content_type.clone();
        let elapsed = page.elapsed;

        let body = page.read_body(cancel).await?;

        Ok(Download {
            final_url,
            content_type,
            elapsed,
            body,
        })
    }
}
