// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (stderr) and parse command-line arguments using clap
// 2. Build one Fetcher and one Crawler shared by everything
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = some pages failed, 2 = error)
//
// Rust concepts used:
// - async/await: Because we make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod classify;      // src/classify/ - labels and topics
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - tunables and defaults
mod crawl;         // src/crawl/ - pipeline and bounded worker pool
mod error;         // src/error.rs - the error taxonomy
mod extract;       // src/extract/ - charset decoding and HTML extraction
mod fetch;         // src/fetch/ - the HTTP client
mod input;         // src/input.rs - CSV / NDJSON URL lists
mod models;        // src/models.rs - result records
mod server;        // src/server.rs - HTTP service
mod telemetry;     // src/telemetry.rs - logging setup

#[cfg(test)]
mod testutil;

use clap::Parser;
use cli::{Cli, Commands};
use crawl::Crawler;
use fetch::Fetcher;
use models::{CrawlResult, Outcome};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    telemetry::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every page was crawled
//   Ok(1) = at least one page failed
//   Err = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let fetcher = Fetcher::new(&cli.tuning.fetch_config()).context("cannot build http client")?;
    let crawl_config = cli.tuning.crawl_config();
    let crawler = Crawler::new(fetcher, &crawl_config);

    match cli.command {
        Commands::Crawl { url, json } => {
            handle_crawl(&crawler, &url, json, crawl_config.task_timeout).await
        }
        Commands::Batch { input, output, stream } => {
            handle_batch(&crawler, &input, output.as_deref(), stream).await
        }
        Commands::Serve { addr } => {
            server::serve(&addr, crawler).await?;
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand
// Parameters:
//   url: the page to crawl
//   json: print the full result as JSON instead of a summary
//   deadline: upper bound for the network phase
async fn handle_crawl(crawler: &Crawler, url: &str, json: bool, deadline: Duration) -> Result<i32> {
    let cancel = cancel_on_ctrl_c();

    match crawler.crawl_one(url, deadline, &cancel).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
            Ok(0)
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&Outcome::failure(url, &e))?);
            } else {
                eprintln!("❌ {}: {}", url, e);
            }
            Ok(1)
        }
    }
}

// Handles the 'batch' subcommand
// Parameters:
//   input: CSV or NDJSON file with the URLs
//   output: NDJSON file for the outcomes (stdout if None)
//   stream: write outcomes in completion order as they arrive
async fn handle_batch(
    crawler: &Crawler,
    input: &Path,
    output: Option<&Path>,
    stream: bool,
) -> Result<i32> {
    let urls = input::read_urls(input)?;
    eprintln!("📄 {} url(s) from {}", urls.len(), input.display());

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let cancel = cancel_on_ctrl_c();
    let total = urls.len();
    let mut failed = 0;

    if stream {
        let mut outcomes = crawler.stream(urls, cancel);
        while let Some(outcome) = outcomes.recv().await {
            failed += usize::from(!outcome.is_ok());
            write_line(&mut writer, &outcome)?;
            // Readers of a stream expect each line as soon as it exists
            writer.flush()?;
        }
    } else {
        for outcome in crawler.collect(urls, &cancel).await {
            failed += usize::from(!outcome.is_ok());
            write_line(&mut writer, &outcome)?;
        }
    }
    writer.flush()?;

    eprintln!("📊 Summary:");
    eprintln!("   ✅ OK: {}", total - failed);
    eprintln!("   ❌ Failed: {}", failed);
    eprintln!("   📋 Total: {}", total);

    Ok(if failed > 0 { 1 } else { 0 })
}

// Ctrl-C cancels in-flight fetches; every URL still gets an outcome line
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("⏹️  interrupted, cancelling in-flight requests");
            trigger.cancel();
        }
    });

    cancel
}

fn write_line(writer: &mut dyn Write, outcome: &Outcome) -> Result<()> {
    serde_json::to_writer(&mut *writer, outcome)?;
    writer.write_all(b"\n")?;
    Ok(())
}

// Prints a short human-readable report for one page
fn print_summary(result: &CrawlResult) {
    println!("🔗 {}", result.source_url);
    println!("{}", "=".repeat(60));
    println!("{:<12} {}", "Title:", result.meta.title);
    println!("{:<12} {}", "Label:", result.classification.label);

    for (signal, detail) in &result.classification.reason {
        println!("{:<12} {} ({})", "", signal, detail);
    }

    println!("{:<12} {}", "Language:", display_or_dash(&result.content.language));
    println!("{:<12} {}", "Words:", result.content.word_count);
    println!("{:<12} {}", "Topics:", result.topics.join(", "));
    println!("{:<12} {} ms", "Fetch:", result.fetch_ms);
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
