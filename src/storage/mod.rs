//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The visited set and the pending URL queue
//! - The target link table, the sole dedup gate for notifications

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{FrontierStore, StorageError, StorageResult};

use crate::TrawlError;

use std::path::Path;
use std::sync::Arc;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(TrawlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, TrawlError> {
    SqliteStorage::new(path)
}

/// Represents a target link in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLinkRecord {
    pub link: String,
    pub source_url: String,
    pub keyword: String,
    pub found_at: String,
}

/// Frontier handle used by the crawl loop
///
/// Wraps a [`FrontierStore`] and turns every storage failure into a logged,
/// safe default so a broken database never stops a cycle. The visited check
/// fails open: an error reads as "not visited" and the page is fetched again.
#[derive(Clone)]
pub struct Frontier {
    store: Arc<dyn FrontierStore>,
}

impl Frontier {
    pub fn new(store: Arc<dyn FrontierStore>) -> Self {
        Self { store }
    }

    /// Underlying backend, for reporting queries
    pub fn store(&self) -> &Arc<dyn FrontierStore> {
        &self.store
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.store.is_visited(url).unwrap_or_else(|e| {
            tracing::error!("Visited check failed for {}: {}", url, e);
            false
        })
    }

    pub fn mark_visited(&self, url: &str) -> bool {
        self.store.mark_visited(url).unwrap_or_else(|e| {
            tracing::error!("Failed to mark {} visited: {}", url, e);
            false
        })
    }

    pub fn enqueue_many(&self, urls: &[String]) -> usize {
        self.store.enqueue_many(urls).unwrap_or_else(|e| {
            tracing::error!("Failed to enqueue {} URLs: {}", urls.len(), e);
            0
        })
    }

    pub fn dequeue_batch(&self, limit: usize) -> Vec<String> {
        self.store.dequeue_batch(limit).unwrap_or_else(|e| {
            tracing::error!("Failed to dequeue batch: {}", e);
            Vec::new()
        })
    }

    pub fn record_target_link(&self, link: &str, source_url: &str, keyword: &str) -> bool {
        self.store
            .record_target_link(link, source_url, keyword)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to record link {}: {}", link, e);
                false
            })
    }
}
