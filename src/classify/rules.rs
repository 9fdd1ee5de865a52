// src/classify/rules.rs
// =============================================================================
// Rule-based page classification.
//
// Labels are tried in a fixed order and the first one whose signals fire
// wins:
//
//   product > news > blog > other
//
// A later label is only looked at when every signal of the earlier labels
// missed, so a page with a price AND the word "blog" is always a product.
// =============================================================================

use crate::models::{Classification, Label, Page};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

// Compiled once, then shared read-only by every task
static PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£₹]\s?\d").expect("price pattern is valid"));
static CART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)add\s+to\s+cart|buy\s+now|checkout").expect("cart pattern is valid")
});
static ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)author|byline|published|updated|minutes\s+read|subscribe")
        .expect("article pattern is valid")
});

// Assigns exactly one label to a page, with the evidence for it.
//
// The text searched is the lower-cased body text followed by the h1/h2/h3
// outline. og:type and the title are checked separately.
pub fn classify(page: &Page) -> Classification {
    let text = format!("{} {}", page.content.text, page.content.headings.join(" ")).to_lowercase();
    let og_type = page
        .meta
        .og
        .get("og:type")
        .map(|value| value.to_lowercase())
        .unwrap_or_default();

    let mut reason = BTreeMap::new();

    // Product: every signal that fires is recorded
    if PRICE.is_match(&text) {
        reason.insert("price".to_string(), "currency-like price detected".to_string());
    }
    if CART.is_match(&text) {
        reason.insert("cart".to_string(), "ecommerce CTA found".to_string());
    }
    if og_type.contains("product") {
        reason.insert("og:type".to_string(), "og:type indicates product".to_string());
    }
    if !reason.is_empty() {
        return Classification {
            label: Label::Product,
            reason,
        };
    }

    if og_type.contains("article") || ARTICLE.is_match(&text) {
        reason.insert("article".to_string(), "article-like markers".to_string());
        return Classification {
            label: Label::News,
            reason,
        };
    }

    if text.contains("blog") || page.meta.title.to_lowercase().contains("blog") {
        reason.insert("blog".to_string(), "blog marker in title/content".to_string());
        return Classification {
            label: Label::Blog,
            reason,
        };
    }

    Classification {
        label: Label::Other,
        reason,
    }
}
