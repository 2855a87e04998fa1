use super::ConfigurationError;
use super::lifecycle::{FlushTicker, Lifecycle, LifecycleState};
use crate::buffer::{BulkBuffer, BulkError};
use crate::domain::serialize_line;
use crate::sender::{ClientConfig, HttpTransport, Transport};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

/// Bulk buffering with the outcome returned from the call itself.
///
/// `log` returns once the line is buffered, or once the batch it triggered
/// has been sent. Periodic flush failures are logged and the affected lines
/// dropped, as for [`AsyncBulkLogger`](super::AsyncBulkLogger).
pub struct SyncBulkLogger {
    buffer: Arc<BulkBuffer>,
    lifecycle: Lifecycle,
}

impl SyncBulkLogger {
    /// `flush_interval_ms <= 0` disables periodic flushing.
    pub fn new(
        config: ClientConfig,
        bulk_byte_size_threshold: i64,
        flush_interval_ms: i64,
    ) -> Result<Self, ConfigurationError> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(
            Arc::new(transport),
            bulk_byte_size_threshold,
            flush_interval_ms,
        )
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        bulk_byte_size_threshold: i64,
        flush_interval_ms: i64,
    ) -> Result<Self, ConfigurationError> {
        let buffer = Arc::new(BulkBuffer::new(transport, bulk_byte_size_threshold)?);
        let ticker = FlushTicker::start(Arc::clone(&buffer), flush_interval_ms);

        Ok(Self {
            buffer,
            lifecycle: Lifecycle::new(ticker),
        })
    }

    pub async fn log<M: Serialize + ?Sized>(&self, message: &M) -> Result<(), BulkError> {
        let _admitted = self.lifecycle.admit().map_err(BulkError::refused)?;
        let line = serialize_line(message).map_err(BulkError::refused)?;

        self.buffer.append(line).await
    }

    pub async fn flush(&self) -> Result<(), BulkError> {
        self.buffer.flush().await
    }

    /// Refuses new messages, stops the ticker, waits for `log` calls already
    /// admitted and returns the outcome of the final flush.
    pub async fn shutdown(&self) -> Result<(), BulkError> {
        let ticker = self.lifecycle.begin_shutdown();
        self.lifecycle.drain(ticker, &self.buffer).await
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn threshold(&self) -> usize {
        self.buffer.threshold()
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.pending_len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.pending_bytes()
    }

    pub fn snapshot(&self) -> Vec<Bytes> {
        self.buffer.snapshot()
    }
}

impl std::fmt::Debug for SyncBulkLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBulkLogger")
            .field("buffer", &self.buffer)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
