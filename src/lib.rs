//! Tele-Trawl: a continuous Telegram link crawler
//!
//! This crate searches the web for keyword-seeded pages, crawls their same-site
//! links through a persistent frontier, records every newly discovered Telegram
//! link exactly once, and relays each discovery to a Telegram chat through a
//! rate-limited delivery pipeline.

pub mod config;
pub mod crawler;
pub mod notify;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Tele-Trawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Tele-Trawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CycleScheduler, LinkClassifier, PageProcessor};
pub use notify::{DeliveryEvent, DeliveryPipeline};
pub use storage::{Frontier, SqliteStorage};
