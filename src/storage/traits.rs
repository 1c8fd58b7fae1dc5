//! Storage traits and error types
//!
//! This module defines the trait interface for frontier backends and
//! associated error types.

use crate::storage::TargetLinkRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for frontier backend implementations
///
/// Every method is a single statement or a single transaction, so callers may
/// share one backend between tasks without extra locking.
pub trait FrontierStore: Send + Sync {
    // ===== Visited Records =====

    /// Records a page URL as visited
    ///
    /// Returns true if the URL was not visited before. Recording an already
    /// visited URL is a no-op, not an error.
    fn mark_visited(&self, url: &str) -> StorageResult<bool>;

    /// Checks whether a page URL has been visited
    fn is_visited(&self, url: &str) -> StorageResult<bool>;

    /// Counts visited records
    fn count_visited(&self) -> StorageResult<u64>;

    // ===== URL Queue =====

    /// Adds URLs to the queue, ignoring duplicates and already visited URLs
    ///
    /// # Returns
    ///
    /// The number of URLs actually inserted
    fn enqueue_many(&self, urls: &[String]) -> StorageResult<usize>;

    /// Removes and returns up to `limit` of the oldest queued URLs
    ///
    /// Selection and removal happen in one transaction, so no URL is ever
    /// handed to two callers.
    fn dequeue_batch(&self, limit: usize) -> StorageResult<Vec<String>>;

    /// Number of URLs waiting in the queue
    fn queue_len(&self) -> StorageResult<u64>;

    // ===== Target Links =====

    /// Inserts a target link
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The link was new and has been stored
    /// * `Ok(false)` - The link was already known
    fn record_target_link(&self, link: &str, source_url: &str, keyword: &str)
        -> StorageResult<bool>;

    /// Checks whether a target link is already stored
    fn link_exists(&self, link: &str) -> StorageResult<bool>;

    /// Counts stored target links
    fn count_links(&self) -> StorageResult<u64>;

    /// Returns the most recently found target links, newest first
    fn recent_links(&self, limit: usize) -> StorageResult<Vec<TargetLinkRecord>>;
}
