use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use telemetry_forwarder::domain::{SourceKind, normalize};
use telemetry_forwarder::mapper;
use telemetry_forwarder::resolver::HostnameResolver;

fn benchmark_severity_normalization(c: &mut Criterion) {
    let tokens = ["ERROR", "WARNING", "NOTICE", "DEBUG", "INFO", "bogus"];

    c.bench_function("normalize_severity", |b| {
        b.iter(|| {
            for token in tokens {
                black_box(normalize(black_box(token)));
            }
        });
    });
}

fn benchmark_record_mapping(c: &mut Criterion) {
    // Literal addresses keep DNS out of the measurement.
    let syslog = br#"{"host":"192.168.1.1","severity":"ERROR","message":"Interface GigabitEthernet0/1 down","timestamp":"2025-01-05T10:45:12Z"}"#;
    let snmp = br#"{"source":"10.0.0.7","oid":"1.3.6.1.6.3.1.1.5.3","value":"linkDown","severity":"WARNING","timestamp":"2025-01-05T10:45:12Z"}"#;
    let resolver = HostnameResolver::default();

    let mut group = c.benchmark_group("record_mapping");
    group.throughput(Throughput::Bytes(syslog.len() as u64));

    group.bench_function("syslog", |b| {
        b.iter(|| mapper::map(SourceKind::Syslog, black_box(syslog), &resolver));
    });

    group.bench_function("snmp", |b| {
        b.iter(|| mapper::map(SourceKind::Snmp, black_box(snmp), &resolver));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_severity_normalization,
    benchmark_record_mapping
);
criterion_main!(benches);
