use super::{decode, nullable_string, parse_timestamp};
use crate::domain::{Event, ParseError, SourceKind, normalize};
use crate::resolver::HostnameResolver;
use serde::Deserialize;

const CATEGORY: &str = "system";

#[derive(Debug, Deserialize)]
struct SyslogRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    host: String,
    #[serde(default, deserialize_with = "nullable_string")]
    severity: String,
    #[serde(default, deserialize_with = "nullable_string")]
    message: String,
    #[serde(default, deserialize_with = "nullable_string")]
    timestamp: String,
}

/// `{"host", "severity", "message", "timestamp"}` → syslog event.
pub fn map_syslog(raw: &[u8], resolver: &HostnameResolver) -> Result<Event, ParseError> {
    let (record, raw_payload): (SyslogRecord, _) = decode(SourceKind::Syslog, raw)?;

    Ok(Event {
        event_type: SourceKind::Syslog,
        source_ip: resolver.resolve(&record.host),
        source_host: record.host,
        severity: normalize(&record.severity),
        category: CATEGORY.to_string(),
        message: record.message,
        raw_payload,
        event_timestamp: parse_timestamp(&record.timestamp),
    })
}
