use super::client::{DeliveryClient, DeliveryError};
use super::transport::EventTransport;
use crate::domain::Event;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Index of a failed event within its batch, paired with the reason.
pub type BatchFailure = (usize, DeliveryError);

impl<T: EventTransport> DeliveryClient<T> {
    /// Sends every event in order and reports only the failures.
    ///
    /// A failing item never stops the items after it; an empty result means
    /// the whole batch was delivered.
    pub async fn send_batch(&self, events: &[Event]) -> Vec<BatchFailure> {
        let mut failures = Vec::new();

        for (index, event) in events.iter().enumerate() {
            if let Err(e) = self.send(event).await {
                warn!("Event {} of batch failed: {}", index, e);
                failures.push((index, e));
            }
        }

        log_batch_outcome(events.len(), &failures);
        failures
    }

    /// Same contract as [`send_batch`](Self::send_batch) with up to
    /// `concurrency` deliveries in flight. Failures are sorted by index.
    pub async fn send_batch_concurrent(
        &self,
        events: &[Event],
        concurrency: usize,
    ) -> Vec<BatchFailure> {
        let mut failures: Vec<BatchFailure> = stream::iter(events.iter().enumerate())
            .map(|(index, event)| async move { (index, self.send(event).await) })
            .buffer_unordered(concurrency.max(1))
            .filter_map(|(index, result)| async move {
                match result {
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Event {} of batch failed: {}", index, e);
                        Some((index, e))
                    }
                }
            })
            .collect()
            .await;

        failures.sort_by_key(|(index, _)| *index);
        log_batch_outcome(events.len(), &failures);
        failures
    }
}

fn log_batch_outcome(total: usize, failures: &[BatchFailure]) {
    if failures.is_empty() {
        info!("Batch of {} events delivered", total);
    } else {
        warn!(
            "Batch of {} events finished with {} failures",
            total,
            failures.len()
        );
    }
}
