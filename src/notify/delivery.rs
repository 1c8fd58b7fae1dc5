//! Rate-limited delivery pipeline
//!
//! A single consumer task drains a bounded FIFO channel and calls the notifier
//! for each event, waiting a fixed delay after every successful send.
//! Producers never wait on delivery: a full channel drops the event, which is
//! safe because the link itself is already stored.

use crate::notify::{DeliveryEvent, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

enum DeliveryMessage {
    Event(DeliveryEvent),
    /// Sentinel that stops the consumer after everything queued before it
    Shutdown,
}

/// Counters reported by the consumer when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Producer side of the pipeline, cheap to clone
#[derive(Clone)]
pub struct DeliveryHandle {
    tx: mpsc::Sender<DeliveryMessage>,
}

impl DeliveryHandle {
    /// Queues an event without waiting
    ///
    /// Returns false when the event was dropped because the channel is full
    /// or the consumer has stopped.
    pub fn enqueue(&self, event: DeliveryEvent) -> bool {
        match self.tx.try_send(DeliveryMessage::Event(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(DeliveryMessage::Event(event))) => {
                tracing::warn!(
                    "Delivery queue full, dropping notification for {}",
                    event.link
                );
                false
            }
            Err(TrySendError::Closed(DeliveryMessage::Event(event))) => {
                tracing::warn!(
                    "Delivery task stopped, dropping notification for {}",
                    event.link
                );
                false
            }
            Err(_) => false,
        }
    }

    /// Number of messages waiting in the channel
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Background delivery task and its channel
pub struct DeliveryPipeline {
    handle: DeliveryHandle,
    worker: JoinHandle<DeliveryStats>,
}

impl DeliveryPipeline {
    /// Starts the consumer task
    ///
    /// # Arguments
    ///
    /// * `notifier` - Destination for every event
    /// * `capacity` - Channel size; events beyond it are dropped
    /// * `send_delay` - Pause after each successful send
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize, send_delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_consumer(notifier, rx, send_delay));

        tracing::info!("Delivery pipeline started (capacity {})", capacity);

        Self {
            handle: DeliveryHandle { tx },
            worker,
        }
    }

    pub fn handle(&self) -> DeliveryHandle {
        self.handle.clone()
    }

    /// Stops the consumer after it drains everything queued so far
    ///
    /// Waits at most `timeout`. On timeout the number of undelivered
    /// notifications is logged, the task is aborted and `None` is returned.
    pub async fn shutdown(mut self, timeout: Duration) -> Option<DeliveryStats> {
        let pending = self.handle.pending();
        if pending > 0 {
            tracing::info!("Waiting for {} pending notifications", pending);
        }

        let tx = self.handle.tx.clone();
        let worker = &mut self.worker;
        let drained = tokio::time::timeout(timeout, async move {
            // A closed channel means the consumer already exited
            let _ = tx.send(DeliveryMessage::Shutdown).await;
            worker.await
        })
        .await;

        match drained {
            Ok(Ok(stats)) => {
                tracing::info!(
                    "Delivery pipeline stopped ({} delivered, {} failed)",
                    stats.delivered,
                    stats.failed
                );
                Some(stats)
            }
            Ok(Err(e)) => {
                tracing::error!("Delivery task ended abnormally: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Delivery shutdown timed out after {:?}, {} notifications left undelivered",
                    timeout,
                    self.handle.pending()
                );
                self.worker.abort();
                None
            }
        }
    }
}

async fn run_consumer(
    notifier: Arc<dyn Notifier>,
    mut rx: mpsc::Receiver<DeliveryMessage>,
    send_delay: Duration,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(message) = rx.recv().await {
        let event = match message {
            DeliveryMessage::Event(event) => event,
            DeliveryMessage::Shutdown => {
                tracing::debug!("Delivery task received shutdown sentinel");
                break;
            }
        };

        match notifier.deliver(&event).await {
            Ok(()) => {
                stats.delivered += 1;
                tracing::info!("Sent notification for {}", event.link);
                if !send_delay.is_zero() {
                    tokio::time::sleep(send_delay).await;
                }
            }
            Err(e) => {
                stats.failed += 1;
                tracing::warn!("Failed to send notification for {}: {}", event.link, e);
            }
        }
    }

    stats
}
