// src/classify/mod.rs
// =============================================================================
// This module decides what kind of page we fetched and what it is about.
//
// Submodules:
// - rules: product / news / blog / other, first match wins
// - topics: most frequent non-stopword tokens
//
// The patterns and the stopword list are process-wide statics, built once
// and only ever read, so tasks can share them without locking.
// =============================================================================

mod rules;
mod topics;

pub use rules::classify;
pub use topics::top_topics;
