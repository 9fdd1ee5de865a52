// src/fetch/mod.rs
// =============================================================================
// This module turns a URL into HTML bytes.
//
// Submodules:
// - http: the Fetcher (shared pooled client, status/content-type policy,
//         capped body reads)
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

mod http;

pub use http::{FetchedPage, Fetcher};
