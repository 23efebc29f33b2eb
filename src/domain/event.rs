use super::error::ValidationError;
use super::severity::Severity;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IP reported when a source host cannot be resolved.
pub const SENTINEL_IP: &str = "0.0.0.0";

/// The raw record format an event was translated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Syslog,
    Snmp,
    Metadata,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Syslog => "syslog",
            SourceKind::Snmp => "snmp",
            SourceKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "syslog" => Ok(SourceKind::Syslog),
            "snmp" => Ok(SourceKind::Snmp),
            "metadata" => Ok(SourceKind::Metadata),
            other => Err(format!(
                "Unknown source kind: {other}. Valid values: syslog, snmp, metadata"
            )),
        }
    }
}

/// The canonical telemetry record.
///
/// Built once by the mapper and handed to the delivery client by reference;
/// nothing downstream mutates it. Field names are the wire names expected by
/// the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: SourceKind,
    pub source_host: String,
    pub source_ip: String,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub raw_payload: String,
    pub event_timestamp: DateTime<Utc>,
}

impl Event {
    /// Structural checks applied before any delivery attempt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_host.is_empty() {
            return Err(ValidationError::MissingField("source_host"));
        }
        if self.message.is_empty() {
            return Err(ValidationError::MissingField("message"));
        }
        if self.category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if self.raw_payload.is_empty() {
            return Err(ValidationError::MissingField("raw_payload"));
        }
        Ok(())
    }

    /// True when the source claimed no usable timestamp.
    pub fn has_zero_timestamp(&self) -> bool {
        self.event_timestamp == zero_timestamp()
    }
}

/// `0001-01-01T00:00:00Z`, used when a record carries no parsable timestamp.
pub fn zero_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
