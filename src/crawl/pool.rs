// src/crawl/pool.rs
// =============================================================================
// This module fans a list of URLs out to concurrent tasks.
//
// How it works:
// 1. A Semaphore with `concurrency` permits is the gate
// 2. For each URL (in input order) we wait for a permit, then spawn a task
// 3. The task runs the pipeline and gives the permit back when it finishes,
//    whether it succeeded or failed
// 4. Results come back one of two ways:
//    - collect(): a Vec in the same order as the input
//    - stream(): a channel that yields outcomes as they complete
//
// Failure isolation:
// - Every task produces exactly one Outcome, success or error
// - A failed (or even panicking) task never cancels its siblings
//
// Rust concepts:
// - tokio::spawn / JoinSet: Run many tasks in parallel on the runtime
// - Semaphore: A counter that limits how many tasks run at once
// - mpsc channel: Send values from many tasks to one receiver
// =============================================================================

use super::pipeline::Pipeline;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::fetch::Fetcher;
use crate::models::{CrawlResult, Outcome};
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

// Runs the pipeline over many URLs with bounded concurrency.
//
// Clone is cheap (the fetcher shares one connection pool), which is how the
// HTTP service hands one Crawler to every request handler.
#[derive(Debug, Clone)]
pub struct Crawler {
    pipeline: Pipeline,
    concurrency: usize,
    task_timeout: Duration,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, config: &CrawlConfig) -> Self {
        Self {
            pipeline: Pipeline::new(fetcher, config.topic_count),
            concurrency: config.concurrency.max(1),
            task_timeout: config.task_timeout,
        }
    }

    // A single URL, outside any batch, with its own deadline
    pub async fn crawl_one(
        &self,
        url: &str,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CrawlError> {
        self.pipeline.run(url, deadline, cancel).await
    }

    // Crawls every URL and returns the outcomes in input order.
    //
    // Returns only after every task has finished. outcomes[i] always belongs
    // to urls[i], no matter which task completed first.
    pub async fn collect(&self, urls: Vec<String>, cancel: &CancellationToken) -> Vec<Outcome> {
        info!(urls = urls.len(), concurrency = self.concurrency, "collect started");

        let gate = Arc::new(Semaphore::new(self.concurrency));

        // handles[i] is the slot for urls[i]
        let mut handles = Vec::with_capacity(urls.len());
        for url in &urls {
            let permit = acquire(&gate).await;
            let task = run_task(self.pipeline.clone(), url.clone(), self.task_timeout, cancel.clone(), permit);
            handles.push(tokio::spawn(task));
        }

        let outcomes: Vec<Outcome> = join_all(handles)
            .await
            .into_iter()
            .zip(urls)
            .map(|(joined, url)| {
                joined.unwrap_or_else(|e| Outcome::failure(url, format!("task failed: {}", e)))
            })
            .collect();

        log_summary("collect", &outcomes);
        outcomes
    }

    // Crawls every URL and yields each outcome as soon as it is ready.
    //
    // The order is completion order, so use Outcome::url to match results to
    // inputs. The receiver returns None only after every task has finished
    // and released its permit.
    //
    // The channel holds at most `concurrency` outcomes; a slow reader makes
    // tasks wait to deliver, which in turn holds back new tasks.
    pub fn stream(&self, urls: Vec<String>, cancel: CancellationToken) -> mpsc::Receiver<Outcome> {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let crawler = self.clone();

        tokio::spawn(async move {
            info!(urls = urls.len(), concurrency = crawler.concurrency, "stream started");

            let gate = Arc::new(Semaphore::new(crawler.concurrency));
            let mut tasks = JoinSet::new();

            for url in urls {
                let permit = acquire(&gate).await;
                let task = run_task(crawler.pipeline.clone(), url, crawler.task_timeout, cancel.clone(), None);
                let tx = tx.clone();

                tasks.spawn(async move {
                    let outcome = task.await;
                    // A closed receiver means nobody is listening any more;
                    // there is nothing useful to do with the outcome
                    let _ = tx.send(outcome).await;
                    drop(permit);
                });
            }

            // Drain barrier: wait for every task before our sender goes away,
            // so the receiver only sees the end of the stream after all of them
            while tasks.join_next().await.is_some() {}
            drop(tx);

            info!("stream finished");
        });

        rx
    }
}

// The gate is never closed, so acquisition only fails if the semaphore is
// dropped; in that case the task simply runs ungated.
async fn acquire(gate: &Arc<Semaphore>) -> Option<OwnedSemaphorePermit> {
    gate.clone().acquire_owned().await.ok()
}

// One task: the pipeline for one URL, with panics turned into an error outcome
async fn run_task(
    pipeline: Pipeline,
    url: String,
    deadline: Duration,
    cancel: CancellationToken,
    permit: Option<OwnedSemaphorePermit>,
) -> Outcome {
    let result = AssertUnwindSafe(pipeline.outcome(url.clone(), deadline, &cancel))
        .catch_unwind()
        .await;
    drop(permit);

    result.unwrap_or_else(|_| Outcome::failure(url, "task panicked"))
}

fn log_summary(mode: &str, outcomes: &[Outcome]) {
    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(mode, ok, failed = outcomes.len() - ok, "batch finished");
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why acquire the permit BEFORE spawning?
//    - If we spawned first, 10,000 URLs would mean 10,000 tasks sitting in
//      memory waiting for a permit
//    - Acquiring first means at most `concurrency` tasks exist at a time
//
// 2. How does collect() keep the input order?
//    - handles[i] is the JoinHandle for urls[i]
//    - join_all waits for all of them and returns results in the same order
//    - Completion order does not matter, the position does
//
// 3. What is an OwnedSemaphorePermit?
//    - A permit that is not tied to a borrow of the semaphore
//    - It can move into a spawned task ('static)
//    - Dropping it returns the permit, even if the task failed
//
// 4. Why does stream() keep its own `tx` until the end?
//    - The receiver sees None once every Sender is gone
//    - Holding one Sender until join_next has drained the JoinSet makes
//      "end of stream" mean "every task has finished"
// -----------------------------------------------------------------------------
