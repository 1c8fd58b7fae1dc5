//! Crawler module for keyword-seeded link discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a size ceiling and content-type filter
//! - HTML parsing and link extraction
//! - Classification of links into target links and same-site pages
//! - Keyword search for seed pages
//! - Per-page processing and the cycle loop

mod classifier;
mod fetcher;
mod parser;
mod processor;
mod scheduler;
mod search;

pub use classifier::{ClassifiedLinks, LinkClassifier};
pub use fetcher::{build_http_client, FetchOutcome, HttpFetcher, PageFetcher};
pub use parser::parse_links;
pub use processor::{PageProcessor, ProcessResult};
pub use scheduler::{politeness_delay, CycleReport, CycleScheduler, QUEUE_KEYWORD};
pub use search::{parse_results, DuckDuckGoSearch, SearchError, SearchProvider};

use crate::config::Config;
use crate::notify::{DeliveryPipeline, TelegramNotifier};
use crate::storage::{Frontier, FrontierStore};
use crate::TrawlError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the crawler against an opened store until shutdown
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client, fetcher and search adapter
/// 2. Start the delivery pipeline when the notifier is usable
/// 3. Run cycles (or exactly one when `once` is set)
/// 4. Drain the delivery pipeline within the configured timeout
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - The frontier backend
/// * `shutdown` - Cancelled by the signal handler
/// * `once` - Stop after a single cycle
///
/// # Returns
///
/// * `Ok(u64)` - Number of cycles run
/// * `Err(TrawlError)` - The HTTP client could not be built
pub async fn trawl(
    config: &Config,
    store: Arc<dyn FrontierStore>,
    shutdown: CancellationToken,
    once: bool,
) -> Result<u64, TrawlError> {
    let client = build_http_client(&config.user_agent.value, config.crawl.request_timeout())?;

    let pipeline = if config.notifier.is_usable() {
        let notifier = TelegramNotifier::new(client.clone(), &config.notifier);
        Some(DeliveryPipeline::spawn(
            Arc::new(notifier),
            config.notifier.queue_capacity,
            Duration::from_millis(config.notifier.send_delay_ms),
        ))
    } else {
        if config.notifier.enabled {
            tracing::warn!("Notifier is enabled but bot-token or chat-id is missing. Notifications disabled.");
        } else {
            tracing::info!("Notifications are disabled in config");
        }
        None
    };

    let mut processor = PageProcessor::new(
        Frontier::new(store),
        Arc::new(HttpFetcher::new(client.clone())),
        LinkClassifier::new(&config.targets),
        shutdown.clone(),
    )
    .with_page_size_limit(config.crawl.page_size_limit());

    if let Some(pipeline) = &pipeline {
        processor = processor.with_delivery(pipeline.handle());
    }

    let search = Arc::new(DuckDuckGoSearch::new(client, config.search.endpoint.clone()));
    let scheduler = CycleScheduler::new(processor, search, config, shutdown);

    let drain_timeout = Duration::from_millis(config.notifier.shutdown_timeout_ms);
    Ok(drive(scheduler, pipeline, once, drain_timeout).await)
}

/// Runs the scheduler on its own task, then drains the delivery pipeline
///
/// A panic inside a cycle is logged and reported as zero cycles; the
/// pipeline is drained either way.
async fn drive(
    mut scheduler: CycleScheduler,
    pipeline: Option<DeliveryPipeline>,
    once: bool,
    drain_timeout: Duration,
) -> u64 {
    let task = tokio::spawn(async move {
        if once {
            scheduler.run_once().await;
            scheduler.cycles()
        } else {
            scheduler.run().await
        }
    });

    let cycles = match task.await {
        Ok(cycles) => cycles,
        Err(e) => {
            tracing::error!("Crawler task failed: {}", e);
            0
        }
    };

    if let Some(pipeline) = pipeline {
        pipeline.shutdown(drain_timeout).await;
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::crawler::processor::tests::StubFetcher;
    use crate::notify::{DeliveryEvent, Notifier, NotifyError};
    use crate::storage::SqliteStorage;
    use std::sync::Mutex;

    /// Answers the first keyword, then panics
    struct FaultySearch;

    #[async_trait::async_trait]
    impl SearchProvider for FaultySearch {
        async fn search(&self, keyword: &str) -> Vec<String> {
            if keyword == "first" {
                vec!["http://a.example/".to_string()]
            } else {
                panic!("search backend exploded on {}", keyword);
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, event: &DeliveryEvent) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(event.link.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_cycle_still_drains_notifications() {
        let config = parse_config(
            r#"
[search]
keywords = ["first", "second"]

[timing]
keyword-delay-ms = 0
fetch-delay-ms = 0
jitter-ms = 0
"#,
        )
        .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = DeliveryPipeline::spawn(notifier.clone(), 16, Duration::ZERO);
        let fetcher = StubFetcher::default().with_page(
            "http://a.example/",
            r#"<a href="https://t.me/alpha">a</a><a href="https://t.me/beta">b</a>"#,
        );
        let token = CancellationToken::new();
        let processor = PageProcessor::new(
            Frontier::new(Arc::new(SqliteStorage::new_in_memory().unwrap())),
            Arc::new(fetcher),
            LinkClassifier::new(&config.targets),
            token.clone(),
        )
        .with_delivery(pipeline.handle());
        let scheduler = CycleScheduler::new(processor, Arc::new(FaultySearch), &config, token);

        let cycles = drive(scheduler, Some(pipeline), true, Duration::from_secs(5)).await;

        assert_eq!(cycles, 0);
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec!["https://t.me/alpha", "https://t.me/beta"]
        );
    }
}
