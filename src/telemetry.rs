// src/telemetry.rs
// Logging setup. Logs go to stderr so that JSON on stdout stays clean;
// RUST_LOG overrides the default level (e.g. RUST_LOG=page_triage=debug).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
