use super::transport::{EventTransport, HttpTransport, TransportConfig, TransportError};
use crate::domain::{Event, ValidationError};
use crate::reliability::RetryPolicy;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a single attempt did not succeed. Both variants are retryable.
#[derive(Error, Debug)]
pub enum AttemptFailure {
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("ingestor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Event validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Ingestor rejected event with HTTP {status} on attempt {attempt}: {body}")]
    NonRetryable {
        status: u16,
        body: String,
        attempt: u32,
    },
    #[error("Failed to deliver event after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptFailure },
    #[error("Delivery cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
    #[error("Health check failed: {0}")]
    Health(AttemptFailure),
}

impl DeliveryError {
    /// Network attempts consumed before the error was returned.
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryError::Validation(_) | DeliveryError::Serialization(_) => 0,
            DeliveryError::NonRetryable { attempt, .. } => *attempt,
            DeliveryError::Exhausted { attempts, .. } | DeliveryError::Cancelled { attempts } => {
                *attempts
            }
            DeliveryError::Health(_) => 1,
        }
    }

    /// True for failures caused by transient conditions at the endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Exhausted { .. })
    }
}

/// Outcome of a successful `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub status: u16,
}

#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryStatsSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub attempts: u64,
    pub retries: u64,
}

impl DeliveryStats {
    fn record_attempt(&self, attempt: u32) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_outcome(&self, delivered: bool) {
        if delivered {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Sends canonical events to the ingestion endpoint with bounded retry.
///
/// The client is read-only after construction apart from its atomic
/// counters, so one instance can serve any number of concurrent `send`
/// calls. Backoff sleeps only suspend the calling task.
#[derive(Debug, Clone)]
pub struct DeliveryClient<T = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
    stats: Arc<DeliveryStats>,
}

impl DeliveryClient<HttpTransport> {
    pub fn from_config(
        transport_config: TransportConfig,
        policy: RetryPolicy,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(transport_config)?;
        Ok(Self::new(transport, policy))
    }
}

impl<T: EventTransport> DeliveryClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            stats: Arc::new(DeliveryStats::default()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn send(&self, event: &Event) -> Result<DeliveryReport, DeliveryError> {
        self.send_with_cancel(event, &CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but stops before the next attempt, or in
    /// the middle of a backoff sleep, once `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        event: &Event,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReport, DeliveryError> {
        event.validate()?;

        let delivery_id = Uuid::new_v4().to_string();
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                if attempt > 0 {
                    self.stats.record_outcome(false);
                }
                return Err(DeliveryError::Cancelled { attempts: attempt });
            }
            attempt += 1;

            let body = serde_json::to_vec(event)?;
            self.stats.record_attempt(attempt);
            debug!(
                "Sending {} event from {} (delivery {}, attempt {}/{})",
                event.event_type, event.source_host, delivery_id, attempt, self.policy.max_attempts
            );

            let failure = match self.transport.post_event(body, &delivery_id).await {
                Ok(response) if response.is_success() => {
                    self.stats.record_outcome(true);
                    info!(
                        "Delivered {} event from {} on attempt {} (HTTP {})",
                        event.event_type, event.source_host, attempt, response.status
                    );
                    return Ok(DeliveryReport {
                        attempts: attempt,
                        status: response.status,
                    });
                }
                Ok(response) if response.is_client_error() => {
                    self.stats.record_outcome(false);
                    error!(
                        "Ingestor rejected {} event from {} with HTTP {}, not retrying",
                        event.event_type, event.source_host, response.status
                    );
                    return Err(DeliveryError::NonRetryable {
                        status: response.status,
                        body: response.body,
                        attempt,
                    });
                }
                Ok(response) => AttemptFailure::Status {
                    status: response.status,
                    body: response.body,
                },
                Err(e) => AttemptFailure::Transport(e),
            };

            if !self.policy.allows_retry_after(attempt) {
                self.stats.record_outcome(false);
                error!(
                    "Giving up on {} event from {} after {} attempts: {}",
                    event.event_type, event.source_host, attempt, failure
                );
                return Err(DeliveryError::Exhausted {
                    attempts: attempt,
                    last: failure,
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Attempt {} for delivery {} failed: {}; retrying in {:?}",
                attempt, delivery_id, failure, delay
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.stats.record_outcome(false);
                    return Err(DeliveryError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// `GET {base}/health`; only HTTP 200 counts as healthy.
    pub async fn health_check(&self) -> Result<(), DeliveryError> {
        let response = self
            .transport
            .health()
            .await
            .map_err(|e| DeliveryError::Health(AttemptFailure::Transport(e)))?;

        if response.status == 200 {
            Ok(())
        } else {
            Err(DeliveryError::Health(AttemptFailure::Status {
                status: response.status,
                body: response.body,
            }))
        }
    }
}
