pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use logging::{LoggingError, setup_logging};
pub use pipeline::{Pipeline, PipelineError, RawRecord};

use crate::domain::SourceKind;
use crate::mapper::EventMapper;
use crate::resolver::HostnameResolver;
use crate::sender::{DeliveryClient, EventTransport};
use anyhow::Context;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info, warn};

/// Outcome of one `App::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct App {
    pipeline: Pipeline,
    kind: SourceKind,
    input: Option<PathBuf>,
}

impl App {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let resolver = Arc::new(HostnameResolver::new(config.resolver_ttl()));
        let client = DeliveryClient::from_config(config.transport_config()?, config.retry_policy())
            .context("failed to build delivery client")?;
        let pipeline =
            Pipeline::new(EventMapper::new(resolver), client).with_concurrency(config.concurrency);

        info!(
            "Configuration: ingestor={}, kind={}, concurrency={}, retry_attempts={}",
            pipeline.client().transport().endpoint(),
            config.kind,
            config.concurrency,
            config.retry_attempts
        );

        Ok(Self {
            pipeline,
            kind: config.kind,
            input: config.input,
        })
    }

    /// Ingests every non-blank line of the input as one record.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        if let Err(e) = self.pipeline.client().health_check().await {
            warn!("Ingestor health check failed, continuing anyway: {}", e);
        }

        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.input {
            Some(path) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open input {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };

        let records = read_records(self.kind, reader).await?;
        let total = records.len();
        let failures = self.pipeline.ingest_batch(records).await;

        for (index, e) in &failures {
            error!("Record {} failed: {}", index, e);
        }

        let stats = self.pipeline.client().stats();
        info!(
            "Run finished: {} records, {} failed, {} attempts, {} retries",
            total,
            failures.len(),
            stats.attempts,
            stats.retries
        );

        Ok(RunSummary {
            total,
            failed: failures.len(),
        })
    }
}

pub async fn read_records<R>(kind: SourceKind, reader: R) -> anyhow::Result<Vec<RawRecord>>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut records = Vec::new();

    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let line = line.trim();
        if !line.is_empty() {
            records.push(RawRecord::new(kind, line));
        }
    }

    Ok(records)
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        // --help and --version land here too
        Err(ConfigError::ArgError(e)) => e.exit(),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    setup_logging(config.log_level, config.log_format)?;
    info!("Starting telemetry-forwarder v{}", get_version());

    let app = App::from_config(config)?;
    match app.run().await {
        Ok(summary) if summary.is_clean() => Ok(()),
        Ok(summary) => {
            error!(
                "{} of {} records were not delivered",
                summary.failed, summary.total
            );
            process::exit(1);
        }
        Err(e) => {
            error!("Application error: {:#}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_records_skips_blank_lines() {
        let input: &[u8] = b"{\"host\":\"a\"}\n\n   \n{\"host\":\"b\"}\r\n";
        let records = read_records(SourceKind::Syslog, input).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, br#"{"host":"a"}"#);
        assert_eq!(records[1].payload, br#"{"host":"b"}"#);
        assert!(records.iter().all(|r| r.kind == SourceKind::Syslog));
    }

    #[test]
    fn test_run_summary() {
        assert!(RunSummary { total: 3, failed: 0 }.is_clean());
        assert!(!RunSummary { total: 3, failed: 1 }.is_clean());
    }
}
