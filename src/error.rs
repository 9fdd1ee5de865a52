// src/error.rs
// =============================================================================
// Every way a single URL can fail on its way through the pipeline.
//
// Each variant is terminal for the URL that produced it and for that URL
// only: the orchestrator records the Display text as the outcome's error and
// moves on to the next URL.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - Enums with data: BadStatus carries the HTTP code, others carry a detail
// =============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    /// The URL did not parse, or has no scheme or host
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The input row was blank, so no request was made
    #[error("empty url")]
    EmptyUrl,

    /// Connection, DNS, TLS or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// The per-request timeout or the task deadline expired
    #[error("request timed out")]
    Timeout,

    /// The caller cancelled the run while the request was in flight
    #[error("request cancelled")]
    Cancelled,

    /// Status code outside 200..400
    #[error("http status {0}")]
    BadStatus(u16),

    /// The response declared gzip but the stream was corrupt
    #[error("decode error: {0}")]
    Decode(String),

    /// The declared media type is not HTML
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The body could not be converted to UTF-8
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The document could not be parsed as HTML
    #[error("parse error: {0}")]
    Parse(String),
}

impl CrawlError {
    // True for failures that happen before any byte reaches the extractor.
    // The HTTP service uses this to pick 502 (upstream) over 422 (content).
    pub fn is_fetch_stage(&self) -> bool {
        !matches!(self, CrawlError::Encoding(_) | CrawlError::Parse(_))
    }

    // True for failures caused by the caller's input rather than the remote site
    pub fn is_input_error(&self) -> bool {
        matches!(self, CrawlError::InvalidUrl(_) | CrawlError::EmptyUrl)
    }
}

// Maps reqwest's error kinds onto our taxonomy.
//
// Only the kinds reqwest can produce during send() and body reads matter here;
// everything else collapses into Network.
impl From<reqwest::Error> for CrawlError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CrawlError::Timeout
        } else if error.is_decode() {
            CrawlError::Decode(error.to_string())
        } else if error.is_builder() {
            CrawlError::InvalidUrl(error.to_string())
        } else {
            CrawlError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_stable() {
        assert_eq!(CrawlError::BadStatus(500).to_string(), "http status 500");
        assert_eq!(CrawlError::EmptyUrl.to_string(), "empty url");
        assert_eq!(
            CrawlError::UnsupportedContentType("application/json".into()).to_string(),
            "unsupported content type: application/json"
        );
    }

    #[test]
    fn test_stage_split() {
        assert!(CrawlError::BadStatus(404).is_fetch_stage());
        assert!(CrawlError::Timeout.is_fetch_stage());
        assert!(!CrawlError::Encoding("bad".into()).is_fetch_stage());
        assert!(!CrawlError::Parse("bad".into()).is_fetch_stage());
        assert!(CrawlError::EmptyUrl.is_input_error());
        assert!(!CrawlError::Network("reset".into()).is_input_error());
    }
}
