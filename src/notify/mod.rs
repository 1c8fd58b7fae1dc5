//! Notification delivery
//!
//! Newly recorded target links are handed to a background task that relays
//! them, one at a time and in discovery order, to a [`Notifier`]:
//! - [`DeliveryPipeline`] owns the bounded channel and the consumer task
//! - [`TelegramNotifier`] sends each link through the Telegram Bot API

mod delivery;
mod telegram;

pub use delivery::{DeliveryHandle, DeliveryPipeline, DeliveryStats};
pub use telegram::{escape_markdown_v2, format_message, TelegramNotifier};

use thiserror::Error;

/// A newly discovered target link on its way to the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    /// Canonical target link
    pub link: String,
    /// Page the link was found on
    pub source_url: String,
    /// Keyword of the cycle phase, or the queue marker
    pub keyword: String,
}

impl DeliveryEvent {
    pub fn new(
        link: impl Into<String>,
        source_url: impl Into<String>,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            source_url: source_url.into(),
            keyword: keyword.into(),
        }
    }
}

/// Errors raised while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notifier rejected message (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Downstream channel for discovery events
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one event; failures are reported, never retried
    async fn deliver(&self, event: &DeliveryEvent) -> Result<(), NotifyError>;
}
