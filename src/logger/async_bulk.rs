use super::ConfigurationError;
use super::lifecycle::{FlushTicker, Lifecycle, LifecycleState};
use super::result::AsyncBulkResult;
use crate::buffer::BulkBuffer;
use crate::domain::serialize_line;
use crate::sender::{ClientConfig, HttpTransport, Transport};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

/// Buffers messages and ships them to the bulk stream in byte-bounded
/// batches, reporting every outcome through an [`AsyncBulkResult`].
///
/// A `log` handle resolves to the outcome of its `append`: `Ok` when the line
/// was only buffered, or the failure of the batch its line triggered. That
/// batch never contains the triggering line itself.
///
/// Batches flushed by the periodic ticker have no caller to report to. When
/// such a flush fails the lines are logged as dropped and are lost.
pub struct AsyncBulkLogger {
    buffer: Arc<BulkBuffer>,
    lifecycle: Arc<Lifecycle>,
}

impl AsyncBulkLogger {
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

    /// Validates the threshold, then starts the ticker. Must be called within
    /// a tokio runtime when periodic flushing is enabled.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        bulk_byte_size_threshold: i64,
        flush_interval_ms: i64,
    ) -> Result<Self, ConfigurationError> {
        let buffer = Arc::new(BulkBuffer::new(transport, bulk_byte_size_threshold)?);
        let ticker = FlushTicker::start(Arc::clone(&buffer), flush_interval_ms);

        Ok(Self {
            buffer,
            lifecycle: Arc::new(Lifecycle::new(ticker)),
        })
    }

    pub fn log<M: Serialize + ?Sized>(&self, message: &M) -> AsyncBulkResult {
        let admitted = match self.lifecycle.admit() {
            Ok(token) => token,
            Err(e) => return AsyncBulkResult::rejected(e),
        };

        let line = match serialize_line(message) {
            Ok(line) => line,
            Err(e) => return AsyncBulkResult::rejected(e),
        };

        let (completion, result) = AsyncBulkResult::pending();
        let buffer = Arc::clone(&self.buffer);
        tokio::spawn(async move {
            let outcome = buffer.append(line).await;
            drop(admitted);
            completion.complete(outcome);
        });

        result
    }

    /// Sends whatever is buffered right now.
    pub fn flush(&self) -> AsyncBulkResult {
        let (completion, result) = AsyncBulkResult::pending();
        let buffer = Arc::clone(&self.buffer);
        tokio::spawn(async move {
            completion.complete(buffer.flush().await);
        });

        result
    }

    /// Refuses new messages from the moment it returns, stops the ticker,
    /// waits for appends already admitted and flushes the remainder. The
    /// handle resolves to the outcome of that final flush.
    pub fn shutdown(&self) -> AsyncBulkResult {
        let ticker = self.lifecycle.begin_shutdown();

        let (completion, result) = AsyncBulkResult::pending();
        let buffer = Arc::clone(&self.buffer);
        let lifecycle = Arc::clone(&self.lifecycle);
        tokio::spawn(async move {
            completion.complete(lifecycle.drain(ticker, &buffer).await);
        });

        result
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

    /// Buffered lines in append order.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.buffer.snapshot()
    }
}

impl std::fmt::Debug for AsyncBulkLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncBulkLogger")
            .field("buffer", &self.buffer)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
