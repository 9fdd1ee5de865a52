// src/crawl/mod.rs
// =============================================================================
// This module drives the fetch -> extract -> classify pipeline.
//
// Features:
// - One task per URL, at most `concurrency` of them at a time
// - Collect mode: every outcome, in input order, once all are done
// - Stream mode: each outcome as soon as it is ready (completion order)
// - A failing URL only ever affects its own outcome
//
// Why no crawl frontier?
// - We triage a given list of URLs; we never follow links
// - So there is no queue of discovered pages and no visited set
// =============================================================================

mod pipeline;
mod pool;

// Re-export the orchestrator
pub use pool::Crawler;
