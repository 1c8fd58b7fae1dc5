use serde::Deserialize;
use std::time::Duration;

/// Default browser-like user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Tele-Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub targets: TargetConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Keyword-seeded search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Keywords searched in order at the start of every cycle
    pub keywords: Vec<String>,

    /// HTML search endpoint queried with a `q` form field
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

/// Page fetching and queue draining limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Number of frontier URLs drained per cycle
    #[serde(rename = "queue-batch-size", default = "default_queue_batch_size")]
    pub queue_batch_size: u32,

    /// Maximum downloaded page size in bytes (0 disables the ceiling)
    #[serde(rename = "max-page-bytes", default = "default_max_page_bytes")]
    pub max_page_bytes: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Politeness delays and cycle cooldown, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Base delay between two keyword searches
    #[serde(rename = "keyword-delay-ms", default = "default_keyword_delay_ms")]
    pub keyword_delay_ms: u64,

    /// Base delay between two page fetches
    #[serde(rename = "fetch-delay-ms", default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// Upper bound of the random jitter added to every politeness delay
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Cooldown between two cycles
    #[serde(rename = "cycle-delay-ms", default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    #[serde(default = "default_user_agent")]
    pub value: String,
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

/// Describes which outbound links count as target links
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Hosts that serve target links, compared without a leading `www.`
    #[serde(default = "default_target_hosts")]
    pub hosts: Vec<String>,

    /// Base every target link is rebuilt on
    #[serde(rename = "canonical-base", default = "default_canonical_base")]
    pub canonical_base: String,

    /// Path segments marking preview variants that are never recorded
    #[serde(rename = "excluded-segments", default = "default_excluded_segments")]
    pub excluded_segments: Vec<String>,
}

/// Telegram bot notifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(rename = "bot-token", default)]
    pub bot_token: String,

    #[serde(rename = "chat-id", default)]
    pub chat_id: String,

    /// Wait after every successful send (milliseconds)
    #[serde(rename = "send-delay-ms", default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Capacity of the delivery channel
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long shutdown waits for pending notifications (milliseconds)
    #[serde(rename = "shutdown-timeout-ms", default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Adds the source page and keyword to every message
    #[serde(rename = "include-source", default)]
    pub include_source: bool,

    /// Bot API endpoint
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,
}

impl NotifierConfig {
    /// Returns true when notifications are enabled and have credentials
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

impl CrawlConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The byte ceiling for one page, or `None` when disabled
    pub fn page_size_limit(&self) -> Option<u64> {
        (self.max_page_bytes > 0).then_some(self.max_page_bytes)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            queue_batch_size: default_queue_batch_size(),
            max_page_bytes: default_max_page_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            keyword_delay_ms: default_keyword_delay_ms(),
            fetch_delay_ms: default_fetch_delay_ms(),
            jitter_ms: default_jitter_ms(),
            cycle_delay_ms: default_cycle_delay_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            hosts: default_target_hosts(),
            canonical_base: default_canonical_base(),
            excluded_segments: default_excluded_segments(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            send_delay_ms: default_send_delay_ms(),
            queue_capacity: default_queue_capacity(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            include_source: false,
            api_base: default_api_base(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}

fn default_queue_batch_size() -> u32 {
    10
}

fn default_max_page_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_keyword_delay_ms() -> u64 {
    5_000
}

fn default_fetch_delay_ms() -> u64 {
    10_000
}

fn default_jitter_ms() -> u64 {
    2_000
}

fn default_cycle_delay_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_database_path() -> String {
    "telescraper.db".to_string()
}

fn default_target_hosts() -> Vec<String> {
    vec!["t.me".to_string(), "telegram.me".to_string()]
}

fn default_canonical_base() -> String {
    "https://t.me".to_string()
}

fn default_excluded_segments() -> Vec<String> {
    vec!["s".to_string()]
}

fn default_send_delay_ms() -> u64 {
    2_000
}

fn default_queue_capacity() -> usize {
    1_000
}

fn default_shutdown_timeout_ms() -> u64 {
    30_000
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
