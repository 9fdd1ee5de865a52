// src/extract/mod.rs
// =============================================================================
// This module turns fetched bytes into a structured Page.
//
// Submodules:
// - charset: detects the source encoding and converts to UTF-8
// - html: parses the document and pulls out metadata, headings and text
//
// Everything here is synchronous CPU work: no network, no shared state.
// =============================================================================

mod charset;
mod html;

pub use html::extract;
