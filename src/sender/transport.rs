use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

const INGEST_PATH: &str = "ingest/event";
const HEALTH_PATH: &str = "health";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Status and body of a completed exchange with the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Carries serialized events to the ingestion endpoint.
///
/// A transport reports what happened on the wire; deciding whether an
/// outcome is retryable belongs to the delivery client.
pub trait EventTransport: Send + Sync {
    fn post_event(
        &self,
        body: Vec<u8>,
        delivery_id: &str,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;

    fn health(&self) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;

    fn endpoint(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
    pub max_idle_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            max_idle_connections: 20,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("telemetry-forwarder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `reqwest`-backed transport for `POST {base}/ingest/event` and
/// `GET {base}/health`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    ingest_url: Url,
    health_url: Url,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let ingest_url = join_endpoint(&config.base_url, INGEST_PATH)?;
        let health_url = join_endpoint(&config.base_url, HEALTH_PATH)?;

        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            ingest_url,
            health_url,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    fn build_headers(&self, delivery_id: &str) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers.insert(
            HeaderName::from_static("x-delivery-id"),
            HeaderValue::from_str(delivery_id).map_err(|e| {
                TransportError::InvalidConfiguration(format!("Invalid delivery ID: {e}"))
            })?,
        );

        headers.insert(
            HeaderName::from_static("x-forwarder-version"),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        Ok(headers)
    }

    async fn finish(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<TransportResponse, TransportError> {
        let response = timeout(self.config.request_timeout, request.send())
            .await
            .map_err(|_| TransportError::Timeout(self.config.request_timeout))?
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(TransportResponse { status, body })
    }
}

impl EventTransport for HttpTransport {
    async fn post_event(
        &self,
        body: Vec<u8>,
        delivery_id: &str,
    ) -> Result<TransportResponse, TransportError> {
        let headers = self.build_headers(delivery_id)?;
        let request = self
            .client
            .post(self.ingest_url.clone())
            .headers(headers)
            .body(body);

        self.finish(request).await
    }

    async fn health(&self) -> Result<TransportResponse, TransportError> {
        let request = self.client.get(self.health_url.clone());
        self.finish(request).await
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }
}

fn join_endpoint(base_url: &str, path: &str) -> Result<Url, TransportError> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| {
        TransportError::InvalidConfiguration(format!("Invalid endpoint URL '{base_url}': {e}"))
    })
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_connect() {
        TransportError::ConnectionFailed(error.to_string())
    } else {
        TransportError::NetworkError(error)
    }
}
