use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use telemetry_forwarder::app::{App, Config, Pipeline, PipelineError, RawRecord};
use telemetry_forwarder::domain::SourceKind;
use telemetry_forwarder::mapper::EventMapper;
use telemetry_forwarder::reliability::RetryPolicy;
use telemetry_forwarder::resolver::HostnameResolver;
use telemetry_forwarder::sender::{DeliveryClient, DeliveryError, TransportConfig};
use tempfile::NamedTempFile;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn pipeline_for(server: &MockServer) -> Pipeline {
    let client = DeliveryClient::from_config(
        TransportConfig::new(server.uri()),
        RetryPolicy::linear(2, Duration::from_millis(5)),
    )
    .unwrap();
    Pipeline::new(
        EventMapper::new(Arc::new(HostnameResolver::default())),
        client,
    )
}

#[tokio::test]
async fn test_snmp_record_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ingest/event"))
        .and(body_partial_json(serde_json::json!({
            "event_type": "snmp",
            "source_host": "10.1.2.3",
            "source_ip": "10.1.2.3",
            "severity": "medium",
            "category": "network",
            "message": "1.3.6.1.2.1.1.3.0 = 123456",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let raw = r#"{"source":"10.1.2.3","oid":"1.3.6.1.2.1.1.3.0","value":123456,"severity":"NOTICE","timestamp":"2025-01-05T10:45:12Z"}"#;
    let report = pipeline_for(&mock_server)
        .ingest(RawRecord::new(SourceKind::Snmp, raw))
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn test_batch_failures_point_at_input_lines() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ingest/event"))
        .and(body_partial_json(serde_json::json!({ "message": "reject me" })))
        .respond_with(ResponseTemplate::new(422))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ingest/event"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let line = |message: &str| {
        RawRecord::new(
            SourceKind::Syslog,
            format!(
                r#"{{"host":"127.0.0.1","severity":"INFO","message":"{message}","timestamp":""}}"#
            ),
        )
    };
    let records = vec![
        line("first"),
        line("reject me"),
        RawRecord::new(SourceKind::Syslog, "garbage"),
        line("fourth"),
    ];

    let failures = pipeline_for(&mock_server)
        .with_concurrency(2)
        .ingest_batch(records)
        .await;

    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].0, 1);
    assert!(matches!(
        failures[0].1,
        PipelineError::Delivery(DeliveryError::NonRetryable { status: 422, .. })
    ));
    assert_eq!(failures[1].0, 2);
    assert!(matches!(failures[1].1, PipelineError::Parse(_)));
}

#[tokio::test]
async fn test_app_runs_input_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ingest/event"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut input = NamedTempFile::new().unwrap();
    writeln!(
        input,
        r#"{{"entity":"10.9.9.9","data":{{"owner":"ops"}},"timestamp":"2025-01-05T10:45:12Z"}}"#
    )
    .unwrap();
    writeln!(input).unwrap();
    writeln!(input, r#"{{"entity":"10.9.9.10","data":null}}"#).unwrap();
    writeln!(input, "[1,2,3]").unwrap();

    let uri = mock_server.uri();
    let input_path = input.path().to_str().unwrap().to_string();
    let config = Config::from_args([
        "telemetry-forwarder",
        "--ingestor-url",
        uri.as_str(),
        "--kind",
        "metadata",
        "--input",
        input_path.as_str(),
    ])
    .unwrap();

    // an unhealthy ingestor only produces a warning
    let summary = App::from_config(config).unwrap().run().await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_clean());
}
