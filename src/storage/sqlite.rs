//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the FrontierStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FrontierStore, StorageError, StorageResult};
use crate::storage::TargetLinkRecord;
use crate::TrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long a statement waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(TrawlError)` - Failed to open or migrate the database
    pub fn new(path: &Path) -> Result<Self, TrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, TrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl FrontierStore for SqliteStorage {
    // ===== Visited Records =====

    fn mark_visited(&self, url: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.lock()?.execute(
            "INSERT OR IGNORE INTO processed_urls (source_url, processed_at) VALUES (?1, ?2)",
            params![url, now],
        )?;
        Ok(inserted > 0)
    }

    fn is_visited(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .lock()?
            .query_row(
                "SELECT 1 FROM processed_urls WHERE source_url = ?1 LIMIT 1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_visited(&self) -> StorageResult<u64> {
        let count: i64 =
            self.lock()?
                .query_row("SELECT COUNT(*) FROM processed_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== URL Queue =====

    fn enqueue_many(&self, urls: &[String]) -> StorageResult<usize> {
        if urls.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO url_queue (url, added_at)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (SELECT 1 FROM processed_urls WHERE source_url = ?1)",
            )?;
            for url in urls {
                inserted += stmt.execute(params![url, now])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn dequeue_batch(&self, limit: usize) -> StorageResult<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let batch: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, url FROM url_queue ORDER BY id ASC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        {
            let mut stmt = tx.prepare("DELETE FROM url_queue WHERE id = ?1")?;
            for (id, _) in &batch {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        Ok(batch.into_iter().map(|(_, url)| url).collect())
    }

    fn queue_len(&self) -> StorageResult<u64> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM url_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Target Links =====

    fn record_target_link(
        &self,
        link: &str,
        source_url: &str,
        keyword: &str,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.lock()?.execute(
            "INSERT OR IGNORE INTO links (link, source_url, keyword, found_at) VALUES (?1, ?2, ?3, ?4)",
            params![link, source_url, keyword, now],
        )?;
        Ok(inserted > 0)
    }

    fn link_exists(&self, link: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .lock()?
            .query_row(
                "SELECT 1 FROM links WHERE link = ?1 LIMIT 1",
                params![link],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn recent_links(&self, limit: usize) -> StorageResult<Vec<TargetLinkRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT link, source_url, keyword, found_at FROM links ORDER BY id DESC LIMIT ?1",
        )?;

        let links = stmt
            .query_map(params![limit as i64], |row| {
                Ok(TargetLinkRecord {
                    link: row.get(0)?,
                    source_url: row.get(1)?,
                    keyword: row.get(2)?,
                    found_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }
}
