use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Destination stream of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// One message per request.
    Single,
    /// Newline-joined batch of messages.
    Bulk,
}

impl Stream {
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Single => "single",
            Stream::Bulk => "bulk",
        }
    }
}

/// Status and body text of a completed request.
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
        (200..=299).contains(&self.status)
    }
}

/// Capability that moves serialized payloads to the ingestion endpoint.
///
/// Implementations own everything about the wire: endpoints, credentials,
/// connection reuse and timeouts. The dispatch engine only sees bytes in and
/// a status out.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: Bytes) -> Result<TransportResponse, TransportError>;

    async fn send_bulk(&self, payload: Bytes) -> Result<TransportResponse, TransportError>;
}
