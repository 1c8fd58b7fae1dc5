//! Page processing
//!
//! Takes one URL through the full pipeline: visited check, fetch, link
//! extraction and classification, then the frontier and link table writes.

use crate::crawler::classifier::{ClassifiedLinks, LinkClassifier};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::parser::parse_links;
use crate::notify::{DeliveryEvent, DeliveryHandle};
use crate::storage::Frontier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What happened to one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// Already visited, nothing fetched
    Skipped,
    /// Fetch reached a definitive outcome; holds the number of new target links
    Processed(usize),
    /// The fetch step raised an error; the URL stays unvisited
    Failed,
}

impl ProcessResult {
    pub fn new_links(&self) -> usize {
        match self {
            Self::Processed(count) => *count,
            Self::Skipped | Self::Failed => 0,
        }
    }
}

/// Runs the fetch-classify-record step for single pages
pub struct PageProcessor {
    frontier: Frontier,
    fetcher: Arc<dyn PageFetcher>,
    classifier: LinkClassifier,
    delivery: Option<DeliveryHandle>,
    shutdown: CancellationToken,
    max_page_bytes: Option<u64>,
}

impl PageProcessor {
    pub fn new(
        frontier: Frontier,
        fetcher: Arc<dyn PageFetcher>,
        classifier: LinkClassifier,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            frontier,
            fetcher,
            classifier,
            delivery: None,
            shutdown,
            max_page_bytes: None,
        }
    }

    /// Emits a [`DeliveryEvent`] for every newly recorded link
    pub fn with_delivery(mut self, delivery: DeliveryHandle) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Abandons bodies larger than `limit` bytes
    pub fn with_page_size_limit(mut self, limit: Option<u64>) -> Self {
        self.max_page_bytes = limit;
        self
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Processes `url` and returns the number of newly recorded target links
    pub async fn process(&self, url: &str, keyword: &str) -> usize {
        self.process_page(url, keyword).await.new_links()
    }

    /// Processes `url` and reports whether it was fetched
    ///
    /// # Flow
    ///
    /// 1. Skip if the URL is already visited
    /// 2. Fetch; every [`FetchOutcome`] is definitive, only an `Err` leaves
    ///    the URL unvisited so a later cycle can retry it
    /// 3. Mark visited and queue same-site links
    /// 4. Record each target link, stopping early on shutdown, and hand new
    ///    ones to the delivery pipeline
    pub async fn process_page(&self, url: &str, keyword: &str) -> ProcessResult {
        if self.frontier.is_visited(url) {
            tracing::debug!("Skipping already visited URL {}", url);
            return ProcessResult::Skipped;
        }

        let outcome = match self.fetcher.fetch(url, self.max_page_bytes).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error processing {}: {}", url, e);
                return ProcessResult::Failed;
            }
        };

        let links = self.extract(url, outcome);

        self.frontier.mark_visited(url);

        if !links.same_site.is_empty() {
            let queued = self.frontier.enqueue_many(&links.same_site);
            if queued > 0 {
                tracing::info!("Queued {} new same-site URLs from {}", queued, url);
            }
        }

        let mut added = 0;
        for link in &links.targets {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, not recording remaining links from {}", url);
                break;
            }

            if !self.frontier.record_target_link(link, url, keyword) {
                tracing::debug!("Link {} already known", link);
                continue;
            }

            added += 1;
            tracing::info!("New link {} (from {})", link, url);

            if let Some(delivery) = &self.delivery {
                delivery.enqueue(DeliveryEvent::new(link.as_str(), url, keyword));
            }
        }

        tracing::debug!("Added {} new links from {}", added, url);
        ProcessResult::Processed(added)
    }

    fn extract(&self, url: &str, outcome: FetchOutcome) -> ClassifiedLinks {
        match outcome {
            FetchOutcome::Page { final_url, body } => {
                if final_url != url {
                    tracing::debug!("{} redirected to {}", url, final_url);
                }
                let Ok(source) = Url::parse(url) else {
                    return ClassifiedLinks::default();
                };
                let found = parse_links(&body, &source);
                tracing::debug!("Found {} anchors in {}", found.len(), url);
                self.classifier.classify(&source, &found)
            }
            FetchOutcome::NotHtml { content_type } => {
                tracing::debug!("Skipping non-HTML content ({}) at {}", content_type, url);
                ClassifiedLinks::default()
            }
            FetchOutcome::TooLarge { limit } => {
                tracing::warn!("Download limit ({} bytes) exceeded for {}", limit, url);
                ClassifiedLinks::default()
            }
            FetchOutcome::HttpError { status_code } => {
                tracing::warn!("HTTP error fetching {}: status {}", url, status_code);
                ClassifiedLinks::default()
            }
            FetchOutcome::NetworkError { error } => {
                tracing::warn!("Request error fetching {}: {}", url, error);
                ClassifiedLinks::default()
            }
        }
    }
}
