use super::transport::{Stream, Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_HOST: &str = "logs-01.loggly.com";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Routing tags, joined with `,` into the endpoint path.
    pub tags: Vec<String>,
    pub token: String,
    pub use_https: bool,
    pub host: String,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            token: String::new(),
            use_https: true,
            host: DEFAULT_HOST.to_string(),
            timeout: None,
            user_agent: format!("rask-log-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new(tags: Vec<String>, token: impl Into<String>, use_https: bool) -> Self {
        Self {
            tags,
            token: token.into(),
            use_https,
            ..Default::default()
        }
    }
}

/// Endpoint of the single-event stream.
pub fn build_event_endpoint(config: &ClientConfig) -> Result<Url, TransportError> {
    build_endpoint(config, "inputs")
}

/// Endpoint of the bulk stream.
pub fn build_bulk_endpoint(config: &ClientConfig) -> Result<Url, TransportError> {
    build_endpoint(config, "bulk")
}

fn build_endpoint(config: &ClientConfig, resource: &str) -> Result<Url, TransportError> {
    let scheme = if config.use_https { "https" } else { "http" };
    let raw = format!(
        "{scheme}://{}/{resource}/{}/tag/{}/",
        config.host,
        config.token,
        config.tags.join(",")
    );

    Url::parse(&raw).map_err(|e| TransportError::InvalidEndpoint(format!("{raw}: {e}")))
}

#[derive(Debug, Default)]
pub struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

impl ClientStats {
    fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// HTTP implementation of [`Transport`] posting plain-text payloads.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    event_url: Url,
    bulk_url: Url,
    stats: Arc<ClientStats>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = ClientBuilder::new().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        Self::with_client(config, client)
    }

    /// Uses a caller-supplied client, e.g. to share a connection pool.
    pub fn with_client(config: ClientConfig, client: Client) -> Result<Self, TransportError> {
        let event_url = build_event_endpoint(&config)?;
        let bulk_url = build_bulk_endpoint(&config)?;

        Ok(Self {
            client,
            config,
            event_url,
            bulk_url,
            stats: Arc::new(ClientStats::default()),
        })
    }

    pub fn event_url(&self) -> &Url {
        &self.event_url
    }

    pub fn bulk_url(&self) -> &Url {
        &self.bulk_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStatsSnapshot {
        self.stats.snapshot()
    }

    async fn post(&self, stream: Stream, payload: Bytes) -> Result<TransportResponse, TransportError> {
        let url = match stream {
            Stream::Single => self.event_url.clone(),
            Stream::Bulk => self.bulk_url.clone(),
        };
        let bytes_sent = payload.len();
        let start = Instant::now();

        let result = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(payload)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_request(false);
                return Err(TransportError::Request(e));
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let response = TransportResponse::new(status, body);
        self.stats.record_request(response.is_success());

        debug!(
            stream = stream.as_str(),
            status,
            bytes_sent,
            latency_ms = start.elapsed().as_millis() as u64,
            "log API call completed"
        );

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: Bytes) -> Result<TransportResponse, TransportError> {
        self.post(Stream::Single, payload).await
    }

    async fn send_bulk(&self, payload: Bytes) -> Result<TransportResponse, TransportError> {
        self.post(Stream::Bulk, payload).await
    }
}
