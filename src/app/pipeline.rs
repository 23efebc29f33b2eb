use crate::domain::{Event, ParseError, SourceKind};
use crate::mapper::EventMapper;
use crate::sender::{DeliveryClient, DeliveryError, DeliveryReport, EventTransport, HttpTransport};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("Mapping task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A raw record tagged with the format it is in.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub kind: SourceKind,
    pub payload: Vec<u8>,
}

impl RawRecord {
    pub fn new(kind: SourceKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }
}

/// Raw record → canonical event → ingestion endpoint.
#[derive(Debug, Clone)]
pub struct Pipeline<T = HttpTransport> {
    mapper: EventMapper,
    client: DeliveryClient<T>,
    concurrency: usize,
}

impl<T: EventTransport> Pipeline<T> {
    pub fn new(mapper: EventMapper, client: DeliveryClient<T>) -> Self {
        Self {
            mapper,
            client,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn client(&self) -> &DeliveryClient<T> {
        &self.client
    }

    /// Maps on the blocking pool, since a cache miss performs a blocking
    /// DNS lookup.
    pub async fn map_record(&self, record: RawRecord) -> Result<Event, PipelineError> {
        let mapper = self.mapper.clone();
        let event =
            tokio::task::spawn_blocking(move || mapper.map(record.kind, &record.payload)).await??;
        Ok(event)
    }

    pub async fn ingest(&self, record: RawRecord) -> Result<DeliveryReport, PipelineError> {
        let event = self.map_record(record).await?;
        Ok(self.client.send(&event).await?)
    }

    /// Maps and delivers every record, reporting failures by input index.
    /// A record that fails to map is skipped; the rest still go out.
    pub async fn ingest_batch(&self, records: Vec<RawRecord>) -> Vec<(usize, PipelineError)> {
        let mut failures = Vec::new();
        let mut events = Vec::with_capacity(records.len());
        let mut origins = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            match self.map_record(record).await {
                Ok(event) => {
                    events.push(event);
                    origins.push(index);
                }
                Err(e) => {
                    warn!("Record {} could not be mapped: {}", index, e);
                    failures.push((index, e));
                }
            }
        }

        debug!(
            "Mapped {} records, {} rejected before delivery",
            events.len(),
            failures.len()
        );

        let delivery_failures = if self.concurrency > 1 {
            self.client
                .send_batch_concurrent(&events, self.concurrency)
                .await
        } else {
            self.client.send_batch(&events).await
        };

        failures.extend(
            delivery_failures
                .into_iter()
                .map(|(position, e)| (origins[position], PipelineError::Delivery(e))),
        );
        failures.sort_by_key(|(index, _)| *index);
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::RetryPolicy;
    use crate::resolver::HostnameResolver;
    use crate::sender::client::test_support::{Scripted, ScriptedTransport};
    use std::sync::Arc;
    use std::time::Duration;

    const SYSLOG: &str = r#"{"host":"10.0.0.5","severity":"WARNING","message":"disk full","timestamp":"2024-01-15T10:30:00Z"}"#;

    fn pipeline(transport: ScriptedTransport) -> Pipeline<ScriptedTransport> {
        let mapper = EventMapper::new(Arc::new(HostnameResolver::default()));
        let client = DeliveryClient::new(transport, RetryPolicy::linear(3, Duration::from_millis(1)));
        Pipeline::new(mapper, client)
    }

    #[tokio::test]
    async fn test_ingest_maps_and_delivers() {
        let transport = ScriptedTransport::new([Scripted::Status(202)]);
        let report = pipeline(transport.clone())
            .ingest(RawRecord::new(SourceKind::Syslog, SYSLOG))
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert_eq!(report.status, 202);

        let requests = transport.requests.lock();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].0).unwrap();
        assert_eq!(body["source_ip"], "10.0.0.5");
        assert_eq!(body["severity"], "high");
        assert_eq!(body["category"], "system");
    }

    #[tokio::test]
    async fn test_ingest_reports_parse_errors() {
        let transport = ScriptedTransport::new([]);
        let result = pipeline(transport.clone())
            .ingest(RawRecord::new(SourceKind::Snmp, "not json"))
            .await;

        assert!(matches!(result, Err(PipelineError::Parse(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_indices_refer_to_input_positions() {
        let transport = ScriptedTransport::new([Scripted::Status(200), Scripted::Status(400)]);
        let records = vec![
            RawRecord::new(SourceKind::Syslog, SYSLOG),
            RawRecord::new(SourceKind::Syslog, "{broken"),
            RawRecord::new(SourceKind::Syslog, SYSLOG),
            RawRecord::new(SourceKind::Syslog, SYSLOG),
        ];

        let failures = pipeline(transport.clone()).ingest_batch(records).await;

        let indices: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, [1, 2]);
        assert!(matches!(failures[0].1, PipelineError::Parse(_)));
        assert!(matches!(
            failures[1].1,
            PipelineError::Delivery(DeliveryError::NonRetryable { status: 400, .. })
        ));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_batch_keeps_input_positions() {
        let transport = ScriptedTransport::new([]);
        let records = vec![
            RawRecord::new(SourceKind::Metadata, "[]"),
            RawRecord::new(SourceKind::Syslog, SYSLOG),
            RawRecord::new(SourceKind::Syslog, r#"{"host":"10.0.0.9"}"#),
        ];

        let failures = pipeline(transport.clone())
            .with_concurrency(4)
            .ingest_batch(records)
            .await;

        let indices: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, [0, 2]);
        assert!(matches!(
            failures[1].1,
            PipelineError::Delivery(DeliveryError::Validation(_))
        ));
        assert_eq!(transport.request_count(), 1);
    }
}
