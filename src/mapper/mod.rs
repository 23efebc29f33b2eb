//! Translation of raw telemetry records into canonical [`Event`]s.
//!
//! Each source kind has its own translator; [`map`] dispatches on
//! [`SourceKind`]. Translators only fail on malformed JSON. Missing fields
//! become empty strings and an unusable timestamp becomes the zero
//! timestamp, so shape problems surface later as validation errors rather
//! than here.

pub mod metadata;
pub mod snmp;
pub mod syslog;

use crate::domain::{Event, ParseError, SourceKind, zero_timestamp};
use crate::resolver::HostnameResolver;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Translates `raw` according to `kind`.
pub fn map(kind: SourceKind, raw: &[u8], resolver: &HostnameResolver) -> Result<Event, ParseError> {
    match kind {
        SourceKind::Syslog => syslog::map_syslog(raw, resolver),
        SourceKind::Snmp => snmp::map_snmp(raw, resolver),
        SourceKind::Metadata => metadata::map_metadata(raw, resolver),
    }
}

/// Mapper bound to a shared resolver, so callers on several tasks reuse
/// one cache.
#[derive(Debug, Clone)]
pub struct EventMapper {
    resolver: Arc<HostnameResolver>,
}

impl EventMapper {
    pub fn new(resolver: Arc<HostnameResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<HostnameResolver> {
        &self.resolver
    }

    pub fn map(&self, kind: SourceKind, raw: &[u8]) -> Result<Event, ParseError> {
        map(kind, raw, &self.resolver)
    }
}

/// Decodes a JSON object into `T` and returns it with the verbatim payload.
pub(crate) fn decode<T: DeserializeOwned>(
    kind: SourceKind,
    raw: &[u8],
) -> Result<(T, String), ParseError> {
    let payload = std::str::from_utf8(raw).map_err(|_| ParseError::InvalidUtf8 { kind })?;
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|source| ParseError::InvalidJson { kind, source })?;

    if !value.is_object() {
        return Err(ParseError::NotAnObject { kind });
    }

    let record = T::deserialize(value).map_err(|source| ParseError::InvalidJson { kind, source })?;
    Ok((record, payload.to_string()))
}

/// RFC3339 timestamp, or the zero timestamp when absent or malformed.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|_| zero_timestamp())
}

/// Treats `null` like a missing field.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
