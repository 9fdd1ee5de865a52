// src/models.rs
// =============================================================================
// The data that flows through the pipeline:
//
//   Fetcher -> bytes -> Extractor -> Page -> Classifier -> CrawlResult
//
// and the per-URL Outcome that wraps either a CrawlResult or an error.
//
// Everything here derives Serialize/Deserialize so the CLI and the HTTP
// service can emit it as JSON. Field names follow the camelCase wire shape.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page-level metadata from <head> and the top-level headings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// og:* properties; a BTreeMap keeps the JSON key order stable
    pub og: BTreeMap<String, String>,
    pub canonical: String,
    pub h1: String,
    pub h2: Vec<String>,
}

/// Normalised body text and the h1/h2/h3 outline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub text: String,
    pub word_count: usize,
    pub language: String,
    pub headings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub meta: Meta,
    pub content: Content,
}

/// Coarse content type of a page.
///
/// The declaration order is also the priority order used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Product,
    News,
    Blog,
    Other,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Label::Product => "product",
            Label::News => "news",
            Label::Blog => "blog",
            Label::Other => "other",
        };
        f.write_str(name)
    }
}

/// A label plus the signals that triggered it (empty for Other)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub reason: BTreeMap<String, String>,
}

/// The success payload for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// URL after redirects
    pub source_url: String,
    pub fetch_ms: u64,
    pub meta: Meta,
    pub content: Content,
    #[serde(rename = "class")]
    pub classification: Classification,
    pub topics: Vec<String>,
}

// Exactly one of result/error per URL. The enum makes "both" and "neither"
// unrepresentable; flatten puts the variant key next to "url" on the wire:
//   {"url": "...", "result": {...}}   or   {"url": "...", "error": "..."}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Result(Box<CrawlResult>),
    Error(String),
}

/// The terminal record for one input URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// The URL exactly as it appeared in the input
    pub url: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl Outcome {
    pub fn success(url: impl Into<String>, result: CrawlResult) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Result(Box::new(result)),
        }
    }

    pub fn failure(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Error(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, OutcomeStatus::Result(_))
    }

    pub fn result(&self) -> Option<&CrawlResult> {
        match &self.status {
            OutcomeStatus::Result(result) => Some(&**result),
            OutcomeStatus::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Result(_) => None,
            OutcomeStatus::Error(message) => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> CrawlResult {
        CrawlResult {
            source_url: "https://example.com/".to_string(),
            fetch_ms: 12,
            meta: Meta {
                title: "Example".to_string(),
                ..Meta::default()
            },
            content: Content {
                text: "hello world".to_string(),
                word_count: 2,
                ..Content::default()
            },
            classification: Classification {
                label: Label::Other,
                reason: BTreeMap::new(),
            },
            topics: vec!["hello".to_string(), "world".to_string()],
        }
    }

    #[test]
    fn test_result_wire_shape() {
        let value = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(value["sourceUrl"], "https://example.com/");
        assert_eq!(value["fetchMs"], 12);
        assert_eq!(value["content"]["wordCount"], 2);
        assert_eq!(value["class"]["label"], "other");
        assert_eq!(value["meta"]["title"], "Example");
        assert!(value["meta"]["og"].is_object());
    }

    #[test]
    fn test_outcome_has_exactly_one_payload() {
        let ok = serde_json::to_value(Outcome::success("https://example.com", sample_result()))
            .unwrap();
        assert!(ok.get("result").is_some());
        assert!(ok.get("error").is_none());

        let failed = serde_json::to_value(Outcome::failure("", "empty url")).unwrap();
        assert_eq!(failed, json!({"url": "", "error": "empty url"}));
    }

    #[test]
    fn test_outcome_accessors() {
        let failed = Outcome::failure("https://example.com", "http status 500");
        assert!(!failed.is_ok());
        assert_eq!(failed.error(), Some("http status 500"));
        assert!(failed.result().is_none());
    }
}
