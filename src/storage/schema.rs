//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Tele-Trawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every target link ever found, once
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL UNIQUE,
    source_url TEXT NOT NULL,
    keyword TEXT NOT NULL,
    found_at TEXT NOT NULL
);

-- Pages that completed a fetch-and-classify pass
CREATE TABLE IF NOT EXISTS processed_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url TEXT NOT NULL UNIQUE,
    processed_at TEXT NOT NULL
);

-- Same-site pages waiting to be fetched, oldest id first
CREATE TABLE IF NOT EXISTS url_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    added_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
///
/// Stored in `PRAGMA user_version` so future migrations can detect old files.
pub fn get_schema_version() -> u32 {
    1
}
