// src/extract/html.rs
// =============================================================================
// This module turns an HTML document into a structured Page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), which recovers from
//   almost any malformed markup instead of failing
//
// What we pull out:
// - <head> metadata: title, description, keywords, og:* tags, canonical link
// - Headings: the first h1, every h2, and the h1/h2/h3 outline
// - Body text: every <p> and <li>, whitespace-collapsed
// - Language: <html lang> or og:locale
//
// <script>, <noscript> and <style> are removed from the tree first, so none
// of their text can leak into the body text, the word count or the topics.
// =============================================================================

use super::charset::decode_to_utf8;
use crate::error::CrawlError;
use crate::models::{Content, Meta, Page};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

// How many leading characters are checked for NUL when looking for binary data
const BINARY_SNIFF_CHARS: usize = 1024;

// Selectors are constants, so a failed parse is a programmer error
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static NON_CONTENT: Lazy<Selector> = Lazy::new(|| selector("script, noscript, style"));
static HTML_ROOT: Lazy<Selector> = Lazy::new(|| selector("html"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:description"]"#));
static KEYWORDS: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="keywords"]"#));
static OPEN_GRAPH: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property^="og:"]"#));
static CANONICAL: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel="canonical"]"#));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static H2: Lazy<Selector> = Lazy::new(|| selector("h2"));
static OUTLINE: Lazy<Selector> = Lazy::new(|| selector("h1, h2, h3"));
static BODY_TEXT: Lazy<Selector> = Lazy::new(|| selector("p, li"));

// Extracts a Page from raw (possibly non-UTF-8) page bytes.
//
// Parameters:
//   bytes: the body as fetched (already size-capped by the fetcher)
//   content_type: the response's Content-Type header, used for the charset
//
// Pure function: no network, no shared state.
pub fn extract(bytes: &[u8], content_type: &str) -> Result<Page, CrawlError> {
    let source = decode_to_utf8(bytes, content_type)?;

    // Binary bodies served without a Content-Type (images, archives) get past
    // the fetcher; NUL never appears in a real HTML page
    if source.chars().take(BINARY_SNIFF_CHARS).any(|c| c == '\0') {
        return Err(CrawlError::Parse("document contains binary data".to_string()));
    }

    let mut document = Html::parse_document(&source);
    strip_non_content(&mut document);

    let og = open_graph(&document);

    let mut description = first_attr(&document, &DESCRIPTION, "content");
    if description.is_empty() {
        description = first_attr(&document, &OG_DESCRIPTION, "content");
    }

    let meta = Meta {
        title: first_text(&document, &TITLE),
        description,
        keywords: keywords(&document),
        canonical: first_attr(&document, &CANONICAL, "href"),
        h1: first_text(&document, &H1),
        h2: all_texts(&document, &H2),
        og,
    };

    let text = body_text(&document);
    let word_count = text.split_whitespace().count();

    let mut language = first_attr(&document, &HTML_ROOT, "lang");
    if language.is_empty() {
        language = meta.og.get("og:locale").cloned().unwrap_or_default();
    }

    let content = Content {
        text,
        word_count,
        language,
        headings: all_texts(&document, &OUTLINE),
    };

    debug!(
        title = %meta.title,
        words = content.word_count,
        headings = content.headings.len(),
        "extracted page"
    );

    Ok(Page { meta, content })
}

// Detaches every script/noscript/style subtree from the DOM
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document.select(&NON_CONTENT).map(|element| element.id()).collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document.select(selector).next().map(element_text).unwrap_or_default()
}

// Trimmed text of every match, in document order, empty ones dropped
fn all_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> String {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

// "Rust, Async ,, Tokio" -> ["rust", "async", "tokio"]
fn keywords(document: &Html) -> Vec<String> {
    let raw = first_attr(document, &KEYWORDS, "content");

    raw.split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

// Later tags with the same property overwrite earlier ones
fn open_graph(document: &Html) -> BTreeMap<String, String> {
    let mut og = BTreeMap::new();

    for element in document.select(&OPEN_GRAPH) {
        let property = element.value().attr("property").unwrap_or_default();
        let content = element.value().attr("content").unwrap_or_default();
        if !property.is_empty() && !content.is_empty() {
            og.insert(property.to_string(), content.to_string());
        }
    }

    og
}

// Paragraphs and list items joined with single spaces
fn body_text(document: &Html) -> String {
    let parts: Vec<String> = all_texts(document, &BODY_TEXT);

    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Lazy<Selector>?
//    - once_cell::sync::Lazy runs its closure the first time it is used
//    - After that every thread shares the same parsed selector
//    - Parsing CSS once instead of once per page keeps extraction cheap
//
// 2. How do we delete nodes with scraper?
//    - Html exposes its tree (an ego_tree::Tree)
//    - We first collect the NodeIds (reading), then detach them (writing)
//    - Doing both in one loop would borrow the document twice
//
// 3. Why split_whitespace().join(" ")?
//    - It collapses any run of spaces, tabs and newlines into one space
//    - And it trims both ends for free
// -----------------------------------------------------------------------------
