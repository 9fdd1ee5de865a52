// src/input.rs
// =============================================================================
// Reads lists of URLs from CSV or NDJSON files.
//
// Supported formats:
// - CSV with a header row containing a "url" column (any case, any position)
// - NDJSON where each line is either {"url": "..."} or a bare URL
//
// The format comes from the file extension. For anything else we try CSV
// first and fall back to NDJSON.
//
// Order is preserved: the n-th URL in the file is the n-th URL we crawl.
// =============================================================================

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Csv,
    Ndjson,
    /// Unknown extension: CSV if that yields URLs, else NDJSON
    Guess,
}

impl ListFormat {
    // "urls.CSV" -> Csv, "batch.jsonl" -> Ndjson, "list.txt" -> Guess
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => ListFormat::Csv,
            Some("ndjson") | Some("jsonl") => ListFormat::Ndjson,
            _ => ListFormat::Guess,
        }
    }
}

// Reads a URL list from disk
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let format = ListFormat::from_file_name(&path.to_string_lossy());

    parse_urls(&bytes, format).with_context(|| format!("cannot parse {}", path.display()))
}

// Parses a URL list that is already in memory (e.g. an uploaded file)
pub fn parse_urls(bytes: &[u8], format: ListFormat) -> Result<Vec<String>> {
    match format {
        ListFormat::Csv => parse_csv(bytes),
        ListFormat::Ndjson => parse_ndjson(bytes),
        ListFormat::Guess => match parse_csv(bytes) {
            Ok(urls) if !urls.is_empty() => Ok(urls),
            _ => parse_ndjson(bytes),
        },
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => bail!("empty csv"),
    };

    let column = header
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case("url"))
        .ok_or_else(|| anyhow!("csv must contain a 'url' header column"))?;

    let mut urls = Vec::new();
    for record in records {
        let record = record?;
        if let Some(value) = record.get(column) {
            let url = value.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }

    Ok(urls)
}

fn parse_ndjson(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes).context("ndjson input is not valid utf-8")?;

    let mut urls = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('{') {
            if let Some(url) = url_field(line) {
                urls.push(url);
                continue;
            }
        }

        // Not a usable JSON record: take the whole line as the URL
        urls.push(line.to_string());
    }

    if urls.is_empty() {
        bail!("no urls found in ndjson");
    }

    Ok(urls)
}

// {"url": "https://..."} -> Some("https://...")
fn url_field(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let url = value.get("url")?.as_str()?;

    (!url.is_empty()).then(|| url.to_string())
}
