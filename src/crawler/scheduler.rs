//! Cycle scheduler
//!
//! This module drives the crawl loop:
//! - Seed phase: search every keyword in order and process the results
//! - Queue phase: drain one batch of same-site URLs from the frontier
//! - Cooldown between cycles
//! - Randomized politeness delays between fetches and searches
//!
//! The shutdown token is observed before each keyword, each URL and during
//! every wait, so a signal ends the current phase at the next checkpoint.

use crate::config::{Config, TimingConfig};
use crate::crawler::processor::{PageProcessor, ProcessResult};
use crate::crawler::search::SearchProvider;
use crate::url::normalize_url;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Keyword recorded for links found while draining the queue
pub const QUEUE_KEYWORD: &str = "queued";

/// Summary of one completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// New links found through keyword search results
    pub keyword_links: usize,
    /// New links found through queued URLs
    pub queue_links: usize,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.keyword_links + self.queue_links
    }
}

/// Repeats search and queue cycles until shutdown
pub struct CycleScheduler {
    processor: PageProcessor,
    search: Arc<dyn SearchProvider>,
    keywords: Vec<String>,
    timing: TimingConfig,
    batch_size: usize,
    shutdown: CancellationToken,
    cycles: u64,
}

impl CycleScheduler {
    pub fn new(
        processor: PageProcessor,
        search: Arc<dyn SearchProvider>,
        config: &Config,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            processor,
            search,
            keywords: config.search.keywords.clone(),
            timing: config.timing.clone(),
            batch_size: config.crawl.queue_batch_size as usize,
            shutdown,
            cycles: 0,
        }
    }

    /// Number of cycles completed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs cycles until the shutdown token is cancelled
    ///
    /// Returns the number of cycles started.
    pub async fn run(&mut self) -> u64 {
        while !self.shutdown.is_cancelled() {
            self.run_once().await;

            if self.shutdown.is_cancelled() {
                break;
            }

            let cooldown = Duration::from_millis(self.timing.cycle_delay_ms);
            tracing::info!("Waiting {:?} before next cycle", cooldown);
            if !self.wait(cooldown).await {
                break;
            }
        }

        tracing::info!("Scheduler stopped after {} cycles", self.cycles);
        self.cycles
    }

    /// Runs a single cycle without the trailing cooldown
    pub async fn run_once(&mut self) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;
        tracing::info!("--- Starting cycle {} ---", cycle);

        let keyword_links = self.seed_phase().await;

        let queue_links = if self.shutdown.is_cancelled() {
            0
        } else {
            self.queue_phase().await
        };

        let report = CycleReport {
            cycle,
            keyword_links,
            queue_links,
        };

        tracing::info!(
            "Cycle {} complete. Total links added this cycle: {} (Keywords: {}, Queue: {})",
            report.cycle,
            report.total(),
            report.keyword_links,
            report.queue_links
        );

        report
    }

    async fn seed_phase(&self) -> usize {
        let mut added = 0;

        for (i, keyword) in self.keywords.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, skipping remaining keywords");
                break;
            }

            tracing::info!(
                "Processing keyword '{}' ({}/{})",
                keyword,
                i + 1,
                self.keywords.len()
            );

            let urls = seed_urls(self.search.search(keyword).await);
            added += self.process_urls(&urls, keyword).await;

            if i + 1 < self.keywords.len() && !self.shutdown.is_cancelled() {
                self.pause(self.timing.keyword_delay_ms).await;
            }
        }

        added
    }

    async fn queue_phase(&self) -> usize {
        let batch = self.processor.frontier().dequeue_batch(self.batch_size);
        if batch.is_empty() {
            tracing::info!("URL queue is empty");
            return 0;
        }

        tracing::info!("Processing {} URLs from the queue", batch.len());
        let added = self.process_urls(&batch, QUEUE_KEYWORD).await;
        tracing::info!("Queue batch finished, added {} new links", added);
        added
    }

    /// Processes URLs in order with a politeness delay after each fetched one
    ///
    /// Dequeued URLs not reached before shutdown are not put back; they come
    /// back when a page links to them again.
    async fn process_urls(&self, urls: &[String], keyword: &str) -> usize {
        let mut added = 0;

        for (i, url) in urls.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, stopping URL processing");
                break;
            }

            tracing::debug!("Processing URL {}/{}: {}", i + 1, urls.len(), url);
            let result = self.processor.process_page(url, keyword).await;
            added += result.new_links();

            let fetched = !matches!(result, ProcessResult::Skipped);
            if fetched && i + 1 < urls.len() && !self.shutdown.is_cancelled() {
                self.pause(self.timing.fetch_delay_ms).await;
            }
        }

        added
    }

    /// Waits `base_ms` plus random jitter, returning early on shutdown
    async fn pause(&self, base_ms: u64) -> bool {
        let delay = politeness_delay(base_ms, self.timing.jitter_ms);
        tracing::debug!("Waiting for {:.2} seconds", delay.as_secs_f64());
        self.wait(delay).await
    }

    /// Sleeps for `duration`; returns false if shutdown interrupted it
    async fn wait(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.shutdown.is_cancelled();
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Drops search results that are not crawlable http(s) URLs
///
/// Fragments are stripped so `page#top` and `page` share one visited record.
fn seed_urls(results: Vec<String>) -> Vec<String> {
    results
        .into_iter()
        .filter_map(|result| match normalize_url(&result) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!("Ignoring search result {}: {}", result, e);
                None
            }
        })
        .collect()
}

/// Base delay plus a uniform random jitter in `[0, jitter_ms]`
pub fn politeness_delay(base_ms: u64, jitter_ms: u64) -> Duration {
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    Duration::from_millis(base_ms + jitter)
}
