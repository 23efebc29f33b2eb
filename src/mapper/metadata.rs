use super::{decode, nullable_string, parse_timestamp};
use crate::domain::{Event, ParseError, Severity, SourceKind};
use crate::resolver::HostnameResolver;
use serde::Deserialize;
use serde_json::Value;

const CATEGORY: &str = "metadata";

#[derive(Debug, Deserialize)]
struct MetadataRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    entity: String,
    // Opaque; retained only through the raw payload.
    #[serde(default)]
    #[allow(dead_code)]
    data: Value,
    #[serde(default, deserialize_with = "nullable_string")]
    timestamp: String,
}

/// `{"entity", "data", "timestamp"}` → informational metadata event.
pub fn map_metadata(raw: &[u8], resolver: &HostnameResolver) -> Result<Event, ParseError> {
    let (record, raw_payload): (MetadataRecord, _) = decode(SourceKind::Metadata, raw)?;

    Ok(Event {
        event_type: SourceKind::Metadata,
        source_ip: resolver.resolve(&record.entity),
        message: format!("Metadata update for {}", record.entity),
        source_host: record.entity,
        severity: Severity::Info,
        category: CATEGORY.to_string(),
        raw_payload,
        event_timestamp: parse_timestamp(&record.timestamp),
    })
}
