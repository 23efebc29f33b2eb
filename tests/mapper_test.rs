use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use telemetry_forwarder::domain::{ParseError, SENTINEL_IP, Severity, SourceKind};
use telemetry_forwarder::mapper::{self, EventMapper};
use telemetry_forwarder::resolver::{HostLookup, HostnameResolver, SystemClock};

/// Static host table that counts how often it is consulted.
#[derive(Clone, Default)]
struct StaticLookup {
    calls: Arc<AtomicUsize>,
}

impl HostLookup for StaticLookup {
    fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match host {
            "router-1" => Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))]),
            "switch-7" => Ok(vec![
                IpAddr::V6(Ipv6Addr::LOCALHOST),
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
            ]),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such host")),
        }
    }
}

fn mapper() -> (EventMapper, Arc<AtomicUsize>) {
    let lookup = StaticLookup::default();
    let calls = lookup.calls.clone();
    let resolver = HostnameResolver::with_backends(Duration::from_secs(300), lookup, SystemClock);
    (EventMapper::new(Arc::new(resolver)), calls)
}

#[test]
fn test_syslog_record_maps_to_canonical_event() {
    let (mapper, _) = mapper();
    let raw = br#"{"host":"router-1","severity":"ERROR","message":"Interface down","timestamp":"2025-01-05T10:45:12Z"}"#;

    let event = mapper.map(SourceKind::Syslog, raw).unwrap();

    assert_eq!(event.event_type, SourceKind::Syslog);
    assert_eq!(event.source_host, "router-1");
    assert_eq!(event.source_ip, "192.168.1.1");
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.category, "system");
    assert_eq!(event.message, "Interface down");
    assert_eq!(event.raw_payload.as_bytes(), raw);
    assert_eq!(event.event_timestamp.to_rfc3339(), "2025-01-05T10:45:12+00:00");
    assert!(event.validate().is_ok());
}

#[test]
fn test_snmp_trap_prefers_ipv4_and_formats_message() {
    let (mapper, _) = mapper();
    let raw = br#"{"source":"switch-7","oid":"1.3.6.1.6.3.1.1.5.3","value":"linkDown","severity":"WARNING","timestamp":"2025-01-05T10:45:12Z"}"#;

    let event = mapper.map(SourceKind::Snmp, raw).unwrap();

    assert_eq!(event.source_ip, "10.0.0.7");
    assert_eq!(event.message, "1.3.6.1.6.3.1.1.5.3 = linkDown");
    assert_eq!(event.severity, Severity::High);
    assert_eq!(event.category, "network");
}

#[test]
fn test_metadata_for_unknown_entity_gets_sentinel() {
    let (mapper, _) = mapper();
    let raw = br#"{"entity":"db-primary","data":{"rack":"r12"},"timestamp":"not a time"}"#;

    let event = mapper.map(SourceKind::Metadata, raw).unwrap();

    assert_eq!(event.source_ip, SENTINEL_IP);
    assert_eq!(event.message, "Metadata update for db-primary");
    assert_eq!(event.severity, Severity::Info);
    assert_eq!(event.category, "metadata");
    assert!(event.has_zero_timestamp());
}

#[test]
fn test_repeated_hosts_share_one_lookup() {
    let (mapper, calls) = mapper();
    let raw = br#"{"host":"router-1","severity":"NOTICE","message":"ok","timestamp":""}"#;

    for _ in 0..5 {
        mapper.map(SourceKind::Syslog, raw).unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let (mapper, calls) = mapper();

    for kind in [SourceKind::Syslog, SourceKind::Snmp, SourceKind::Metadata] {
        let err = mapper.map(kind, b"{not json").unwrap_err();
        assert_eq!(err.kind(), kind);
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_missing_fields_surface_at_validation() {
    let resolver = HostnameResolver::with_backends(
        Duration::from_secs(300),
        StaticLookup::default(),
        SystemClock,
    );

    let event = mapper::map(SourceKind::Syslog, b"{}", &resolver).unwrap();

    assert_eq!(event.source_host, "");
    assert_eq!(event.source_ip, SENTINEL_IP);
    assert_eq!(event.severity, Severity::Info);
    assert!(event.validate().is_err());
}
