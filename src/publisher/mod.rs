//! Alternate message-queue transport.
//!
//! Publishing is fire-and-forget from the producer's point of view: the
//! call returns as soon as the message is queued, and the broker's
//! acknowledgment arrives later through a [`DeliveryReceipt`]. Awaiting the
//! receipt is optional. A dropped or detached receipt means nobody observes
//! the outcome except the log.

use crate::domain::Event;
use std::future::Future;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const DEFAULT_TOPIC: &str = "ingestion-events";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Publisher queue is closed")]
    Closed,
    #[error("Publisher queue is full")]
    QueueFull,
    #[error("Broker rejected message: {0}")]
    Rejected(String),
    #[error("Acknowledgment dropped before the broker answered")]
    AckDropped,
}

/// Pending broker acknowledgment for one published message.
#[derive(Debug)]
pub struct DeliveryReceipt {
    topic: String,
    rx: oneshot::Receiver<Result<(), PublishError>>,
}

impl DeliveryReceipt {
    pub fn new(topic: impl Into<String>, rx: oneshot::Receiver<Result<(), PublishError>>) -> Self {
        Self {
            topic: topic.into(),
            rx,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn wait(self) -> Result<(), PublishError> {
        self.rx.await.unwrap_or(Err(PublishError::AckDropped))
    }

    /// Hands the acknowledgment to a background task that only logs it.
    /// Must be called inside a tokio runtime.
    pub fn detach(self) {
        tokio::spawn(async move {
            let topic = self.topic.clone();
            match self.wait().await {
                Ok(()) => debug!("Message delivered to {}", topic),
                Err(e) => warn!("Message delivery to {} failed: {}", topic, e),
            }
        });
    }
}

/// Publishes canonical events to a single topic.
pub trait EventPublisher: Send + Sync {
    fn topic(&self) -> &str;

    fn publish(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<DeliveryReceipt, PublishError>> + Send;
}

/// A message waiting for the broker side of a [`ChannelPublisher`].
#[derive(Debug)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub ack: oneshot::Sender<Result<(), PublishError>>,
}

impl QueuedMessage {
    pub fn acknowledge(self, outcome: Result<(), PublishError>) {
        // The producer may have dropped its receipt already.
        let _ = self.ack.send(outcome);
    }
}

/// In-process publisher backed by a bounded channel.
///
/// The receiving half stands in for the broker client: whatever drains it
/// decides when and how each message is acknowledged.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    topic: String,
    tx: mpsc::Sender<QueuedMessage>,
}

impl ChannelPublisher {
    pub fn new(topic: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<QueuedMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                topic: topic.into(),
                tx,
            },
            rx,
        )
    }

    /// Non-waiting variant of `publish`; fails with `QueueFull` instead of
    /// applying backpressure.
    pub fn try_publish(&self, event: &Event) -> Result<DeliveryReceipt, PublishError> {
        let (message, receipt) = self.prepare(event)?;
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })?;
        Ok(receipt)
    }

    fn prepare(&self, event: &Event) -> Result<(QueuedMessage, DeliveryReceipt), PublishError> {
        let payload = serde_json::to_vec(event)?;
        let (ack, rx) = oneshot::channel();
        let message = QueuedMessage {
            topic: self.topic.clone(),
            payload,
            ack,
        };
        Ok((message, DeliveryReceipt::new(self.topic.clone(), rx)))
    }
}

impl EventPublisher for ChannelPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, event: &Event) -> Result<DeliveryReceipt, PublishError> {
        let (message, receipt) = self.prepare(event)?;
        self.tx
            .send(message)
            .await
            .map_err(|_| PublishError::Closed)?;
        debug!("Queued {} event for topic {}", event.event_type, self.topic);
        Ok(receipt)
    }
}
