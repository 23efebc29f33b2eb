use super::{decode, nullable_string, parse_timestamp};
use crate::domain::{Event, ParseError, SourceKind, normalize};
use crate::resolver::HostnameResolver;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const CATEGORY: &str = "network";

#[derive(Debug, Deserialize)]
struct SnmpTrapRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    source: String,
    #[serde(default, deserialize_with = "nullable_string")]
    oid: String,
    #[serde(default, deserialize_with = "scalar_string")]
    value: String,
    #[serde(default, deserialize_with = "nullable_string")]
    severity: String,
    #[serde(default, deserialize_with = "nullable_string")]
    timestamp: String,
}

/// `{"source", "oid", "value", "severity", "timestamp"}` → SNMP event whose
/// message reads `"<oid> = <value>"`.
pub fn map_snmp(raw: &[u8], resolver: &HostnameResolver) -> Result<Event, ParseError> {
    let (record, raw_payload): (SnmpTrapRecord, _) = decode(SourceKind::Snmp, raw)?;

    Ok(Event {
        event_type: SourceKind::Snmp,
        source_ip: resolver.resolve(&record.source),
        source_host: record.source,
        severity: normalize(&record.severity),
        category: CATEGORY.to_string(),
        message: format!("{} = {}", record.oid, record.value),
        raw_payload,
        event_timestamp: parse_timestamp(&record.timestamp),
    })
}

/// Varbind values arrive as strings from most agents, but counters and
/// gauges are sometimes sent as bare numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
