//! Statistics generation from the link database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{FrontierStore, TargetLinkRecord};
use crate::TrawlError;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct TrawlStatistics {
    /// Total number of target links recorded
    pub total_links: u64,

    /// Number of pages marked visited
    pub visited_pages: u64,

    /// Number of same-site URLs waiting in the queue
    pub queued_urls: u64,

    /// Most recently found links, newest first
    pub recent_links: Vec<TargetLinkRecord>,
}

impl TrawlStatistics {
    /// Counts the recent links per keyword
    pub fn recent_by_keyword(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.recent_links {
            *counts.entry(record.keyword.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `recent` - How many of the newest links to include
///
/// # Returns
///
/// * `Ok(TrawlStatistics)` - Successfully loaded statistics
/// * `Err(TrawlError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn FrontierStore,
    recent: usize,
) -> Result<TrawlStatistics, TrawlError> {
    Ok(TrawlStatistics {
        total_links: storage.count_links()?,
        visited_pages: storage.count_visited()?,
        queued_urls: storage.queue_len()?,
        recent_links: storage.recent_links(recent)?,
    })
}

/// Formats statistics as a plain-text report
pub fn render_statistics(stats: &TrawlStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Tele-Trawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Links found: {}", stats.total_links);
    let _ = writeln!(out, "  Pages visited: {}", stats.visited_pages);
    let _ = writeln!(out, "  URLs queued: {}", stats.queued_urls);
    let _ = writeln!(out);

    if stats.recent_links.is_empty() {
        let _ = writeln!(out, "No links recorded yet.");
        return out;
    }

    let _ = writeln!(out, "Recent Links ({}):", stats.recent_links.len());
    for record in &stats.recent_links {
        let _ = writeln!(
            out,
            "  {}  {}  [{}] from {}",
            record.found_at, record.link, record.keyword, record.source_url
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Recent Links by Keyword:");
    for (keyword, count) in stats.recent_by_keyword() {
        let _ = writeln!(out, "  {}: {}", keyword, count);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &TrawlStatistics) {
    print!("{}", render_statistics(stats));
}
