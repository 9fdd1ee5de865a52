// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Tuning flags are global (they work before or after the subcommand) and
// each one falls back to a PAGE_TRIAGE_* environment variable.
// =============================================================================

use crate::config::{CrawlConfig, FetchConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_TOPIC_COUNT};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "page-triage",
    version,
    about = "Fetch web pages and classify them as product, news, blog or other",
    long_about = "page-triage downloads pages, extracts their metadata and text, labels each one \
                  (product / news / blog / other) and lists its top keywords. \
                  It works on a single URL, a CSV/NDJSON list of URLs, or as an HTTP service."
)]
pub struct Cli {
    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(subcommand)]
    pub command: Commands,
}

// Knobs shared by every subcommand
#[derive(Args, Debug)]
pub struct TuningArgs {
    /// Whole-request timeout in seconds
    #[arg(long, global = true, env = "PAGE_TRIAGE_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Connection (and TLS handshake) timeout in seconds
    #[arg(long, global = true, env = "PAGE_TRIAGE_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// Maximum bytes of each page that are read; the rest is ignored
    #[arg(long, global = true, env = "PAGE_TRIAGE_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// How many URLs are fetched at the same time
    #[arg(
        long,
        global = true,
        env = "PAGE_TRIAGE_CONCURRENCY",
        default_value_t = 10,
        value_parser = parse_concurrency
    )]
    pub concurrency: usize,

    /// Deadline in seconds for one URL inside a batch
    #[arg(long, global = true, env = "PAGE_TRIAGE_TASK_TIMEOUT_SECS", default_value_t = 25)]
    pub task_timeout_secs: u64,
}

// This enum defines our subcommands (crawl, batch, serve)
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl and classify a single page
    ///
    /// Example: page-triage crawl https://example.com/article --json
    Crawl {
        /// Page URL (e.g., https://example.com)
        url: String,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Crawl every URL in a CSV (with a "url" column) or NDJSON file
    ///
    /// Example: page-triage batch --input urls.csv --output results.ndjson
    Batch {
        /// Input file (.csv, .ndjson or .jsonl)
        #[arg(long, short)]
        input: PathBuf,

        /// Output NDJSON file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write results as they finish instead of in input order
        #[arg(long)]
        stream: bool,
    },

    /// Run the HTTP service
    ///
    /// Example: page-triage serve --addr 127.0.0.1:8080
    Serve {
        /// Address to listen on
        #[arg(long, env = "PAGE_TRIAGE_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

impl TuningArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            ..FetchConfig::default()
        }
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            topic_count: DEFAULT_TOPIC_COUNT,
            ..CrawlConfig::default()
        }
        .with_concurrency(self.concurrency)
    }
}

// A gate with zero permits would never let anything through
fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `global = true` do?
//    - The flag is accepted both before and after the subcommand name
//    - `page-triage --concurrency 4 batch -i urls.csv` and
//      `page-triage batch -i urls.csv --concurrency 4` are the same
//
// 2. What does `env = "..."` do?
//    - If the flag is missing, clap reads the environment variable
//    - Handy for the server, which usually runs in a container
//
// 3. What is #[command(flatten)]?
//    - It pulls the fields of TuningArgs into Cli as if they were declared there
//    - Keeps the tuning flags in one reusable struct
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["page-triage", "crawl", "https://example.com"]).unwrap();
        let crawl = cli.tuning.crawl_config();
        let fetch = cli.tuning.fetch_config();

        assert_eq!(crawl.concurrency, 10);
        assert_eq!(crawl.task_timeout, Duration::from_secs(25));
        assert_eq!(fetch.timeout, Duration::from_secs(15));
        assert_eq!(fetch.max_body_bytes, 5 * 1024 * 1024);
        assert!(matches!(cli.command, Commands::Crawl { json: false, .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "page-triage",
            "batch",
            "--input",
            "urls.csv",
            "--concurrency",
            "3",
            "--stream",
        ])
        .unwrap();

        assert_eq!(cli.tuning.concurrency, 3);
        match cli.command {
            Commands::Batch { input, output, stream } => {
                assert_eq!(input, PathBuf::from("urls.csv"));
                assert!(output.is_none());
                assert!(stream);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Cli::try_parse_from(["page-triage", "--concurrency", "0", "serve"]);
        assert!(result.is_err());
    }
}
