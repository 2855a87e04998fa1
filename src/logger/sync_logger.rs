use super::ConfigurationError;
use crate::domain::{LogError, serialize_line};
use crate::sender::{ClientConfig, HttpTransport, Transport, classify};
use serde::Serialize;
use std::sync::Arc;

/// Sends each message with its own request and awaits the outcome.
///
/// The simplest strategy; prefer an asynchronous or bulk logger when
/// throughput matters.
#[derive(Clone)]
pub struct SyncLogger {
    transport: Arc<dyn Transport>,
}

impl SyncLogger {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigurationError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn log<M: Serialize + ?Sized>(&self, message: &M) -> Result<(), LogError> {
        let line = serialize_line(message)?;
        classify(self.transport.send(line).await)
    }
}

impl std::fmt::Debug for SyncLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncLogger").finish_non_exhaustive()
    }
}
