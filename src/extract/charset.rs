// src/extract/charset.rs
// =============================================================================
// Converts raw page bytes to a UTF-8 String.
//
// Where the encoding comes from, first match wins:
// 1. A byte-order mark at the start of the body
// 2. charset=... in the Content-Type header
// 3. <meta charset="..."> or <meta http-equiv ... content="...charset=...">
//    in the first 1024 bytes
// 4. A statistical guess (chardetng)
//
// Malformed sequences become U+FFFD instead of failing the page. If the
// chosen encoding hits errors but the bytes are valid UTF-8 anyway (a wrong
// declaration), we keep them as they are. The only failure is a label that
// maps to the "replacement" decoder (ISO-2022-KR, HZ-GB-2312, ...) on bytes
// that are not UTF-8: there is nothing usable to decode with.
// =============================================================================

use crate::error::CrawlError;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

const PRESCAN_BYTES: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

pub fn decode_to_utf8(bytes: &[u8], content_type: &str) -> Result<String, CrawlError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (sniff_encoding(bytes, content_type), bytes),
    };

    if encoding == REPLACEMENT {
        return std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| unusable(encoding, e));
    }

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if !had_errors {
        return Ok(text.into_owned());
    }

    debug!(encoding = encoding.name(), "malformed input, checking raw utf-8");

    match std::str::from_utf8(bytes) {
        Ok(raw) if encoding != UTF_8 => Ok(raw.to_owned()),
        _ => Ok(text.into_owned()),
    }
}

fn unusable(encoding: &'static Encoding, error: std::str::Utf8Error) -> CrawlError {
    if encoding == UTF_8 {
        CrawlError::Encoding(format!("body is not valid utf-8: {}", error))
    } else {
        CrawlError::Encoding(format!(
            "no usable decoder for {} and body is not valid utf-8: {}",
            encoding.name(),
            error
        ))
    }
}

fn sniff_encoding(bytes: &[u8], content_type: &str) -> &'static Encoding {
    if let Some(encoding) = header_charset(content_type).and_then(|label| Encoding::for_label(label.as_bytes())) {
        return encoding;
    }

    let head = &bytes[..bytes.len().min(PRESCAN_BYTES)];
    if let Some(encoding) = META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        // A page cannot declare itself UTF-16 from inside an ASCII-compatible
        // <meta>; output_encoding maps that case to UTF-8
        return encoding.output_encoding();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

// "text/html; charset=ISO-8859-1" -> Some("ISO-8859-1")
fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}
