use super::threshold::{ThresholdError, validate_bulk_byte_size_threshold};
use crate::domain::LogError;
use crate::sender::{Transport, classify};
use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Separator between lines of a bulk payload.
pub const NEWLINE: u8 = b'\n';

/// A failed flush: the error plus every line of the batch that was not
/// delivered, in append order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error} ({count} message(s) not delivered)", count = .failed_messages.len())]
pub struct BulkError {
    #[source]
    pub error: LogError,
    pub failed_messages: Vec<Bytes>,
}

impl BulkError {
    pub fn new(error: LogError, failed_messages: Vec<Bytes>) -> Self {
        Self {
            error,
            failed_messages,
        }
    }

    /// A failure that never reached the buffer.
    pub fn refused(error: LogError) -> Self {
        Self::new(error, Vec::new())
    }
}

pub type FlushOutcome = Result<(), BulkError>;

#[derive(Debug, Default)]
struct PendingLines {
    lines: Vec<Bytes>,
    // len(line) + 1 per line, the 1 being the separator
    size: usize,
}

impl PendingLines {
    fn push(&mut self, line: Bytes) {
        self.size += line.len() + 1;
        self.lines.push(line);
    }

    fn take(&mut self) -> Vec<Bytes> {
        self.size = 0;
        std::mem::take(&mut self.lines)
    }

    fn reseed(&mut self, line: Bytes) -> Vec<Bytes> {
        let previous = self.take();
        self.push(line);
        previous
    }
}

/// Byte-bounded line buffer that ships its contents to the bulk stream.
///
/// Two locks guard it. The line lock is held only for in-memory mutation and
/// never across a network call, so appends keep flowing while a batch is in
/// flight. The flush lock is held for the whole take-and-send step, so
/// batches leave in the order their lines were appended and two flushes
/// never interleave. Lock order is always flush, then lines.
pub struct BulkBuffer {
    transport: Arc<dyn Transport>,
    threshold: usize,
    pending: Mutex<PendingLines>,
    flush_lock: tokio::sync::Mutex<()>,
}

impl BulkBuffer {
    pub fn new(transport: Arc<dyn Transport>, threshold: i64) -> Result<Self, ThresholdError> {
        let threshold = validate_bulk_byte_size_threshold(threshold)?;

        Ok(Self {
            transport,
            threshold,
            pending: Mutex::new(PendingLines::default()),
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Buffers a serialized line.
    ///
    /// When the line would push the buffer to or past the threshold, the
    /// current contents are flushed and the line seeds the next batch. The
    /// returned outcome then belongs to the flushed batch, never to `line`.
    pub async fn append(&self, line: Bytes) -> FlushOutcome {
        {
            let mut pending = self.pending.lock();
            if pending.size + line.len() < self.threshold {
                pending.push(line);
                debug!(
                    pending_lines = pending.lines.len(),
                    pending_bytes = pending.size,
                    "buffered message"
                );
                return Ok(());
            }
        }

        let _flushing = self.flush_lock.lock().await;
        let batch = {
            let mut pending = self.pending.lock();
            // Another flush may have drained the buffer while we waited.
            if pending.size + line.len() < self.threshold {
                pending.push(line);
                return Ok(());
            }
            pending.reseed(line)
        };

        debug!(lines = batch.len(), "bulk byte size threshold reached");
        self.send_batch(batch).await
    }

    /// Sends whatever is buffered. An empty buffer is a successful no-op.
    pub async fn flush(&self) -> FlushOutcome {
        let _flushing = self.flush_lock.lock().await;
        let batch = self.pending.lock().take();
        self.send_batch(batch).await
    }

    pub fn pending_bytes(&self) -> usize {
        self.pending.lock().size
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().lines.is_empty()
    }

    /// Buffered lines in append order.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.pending.lock().lines.clone()
    }

    async fn send_batch(&self, batch: Vec<Bytes>) -> FlushOutcome {
        if batch.is_empty() {
            return Ok(());
        }

        let batch_id = Uuid::new_v4();
        let payload = join_lines(&batch);
        debug!(
            %batch_id,
            lines = batch.len(),
            bytes = payload.len(),
            "sending bulk payload"
        );

        match classify(self.transport.send_bulk(payload).await) {
            Ok(()) => {
                debug!(%batch_id, lines = batch.len(), "bulk payload delivered");
                Ok(())
            }
            Err(error) => {
                warn!(
                    %batch_id,
                    lines = batch.len(),
                    error = %error,
                    "bulk payload rejected"
                );
                Err(BulkError::new(error, batch))
            }
        }
    }
}

impl std::fmt::Debug for BulkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.pending.lock();
        f.debug_struct("BulkBuffer")
            .field("threshold", &self.threshold)
            .field("pending_lines", &pending.lines.len())
            .field("pending_bytes", &pending.size)
            .finish_non_exhaustive()
    }
}

/// Joins lines with a single separator and no trailing one.
pub fn join_lines(lines: &[Bytes]) -> Bytes {
    let capacity = lines.iter().map(Bytes::len).sum::<usize>() + lines.len().saturating_sub(1);
    let mut payload = BytesMut::with_capacity(capacity);

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            payload.put_u8(NEWLINE);
        }
        payload.put_slice(line);
    }

    payload.freeze()
}
