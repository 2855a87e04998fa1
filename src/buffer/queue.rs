use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Push attempted after the queue was closed. Hands the item back.
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}

/// Producer side of a bounded, closable job queue.
///
/// Closing is explicit and separate from emptiness: after [`close`] every
/// push fails, while consumers keep draining what was already queued. A
/// [`discard`] additionally makes consumers stop at once and drops the
/// remaining items.
///
/// [`close`]: JobQueue::close
/// [`discard`]: JobQueue::discard
pub struct JobQueue<T> {
    sender: RwLock<Option<mpsc::Sender<T>>>,
    capacity: usize,
    discard: CancellationToken,
}

/// Consumer side shared by every worker.
pub struct QueueReceiver<T> {
    receiver: Mutex<mpsc::Receiver<T>>,
    discard: CancellationToken,
}

impl<T: Send> JobQueue<T> {
    /// Creates a queue holding at most `capacity` items (minimum 1).
    pub fn bounded(capacity: usize) -> (Arc<JobQueue<T>>, Arc<QueueReceiver<T>>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let discard = CancellationToken::new();

        let queue = JobQueue {
            sender: RwLock::new(Some(sender)),
            capacity,
            discard: discard.clone(),
        };
        let receiver = QueueReceiver {
            receiver: Mutex::new(receiver),
            discard,
        };

        (Arc::new(queue), Arc::new(receiver))
    }

    /// Enqueues an item, waiting while the queue is full.
    pub async fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        let sender = self.sender.read().clone();
        let Some(sender) = sender else {
            return Err(QueueClosed(item));
        };

        sender.send(item).await.map_err(|e| QueueClosed(e.0))
    }

    /// Number of queued items. Zero once closed.
    pub fn len(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map_or(0, |sender| sender.max_capacity() - sender.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stops accepting items. Already queued items are still delivered.
    pub fn close(&self) {
        self.sender.write().take();
    }

    /// Stops accepting items and drops everything still queued.
    pub fn discard(&self) {
        self.close();
        self.discard.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }
}

impl<T: Send> QueueReceiver<T> {
    /// Next item, or `None` once the queue is closed and drained, or
    /// discarded.
    pub async fn recv(&self) -> Option<T> {
        if self.discard.is_cancelled() {
            return None;
        }

        let mut receiver = tokio::select! {
            biased;
            () = self.discard.cancelled() => return None,
            guard = self.receiver.lock() => guard,
        };

        tokio::select! {
            biased;
            () = self.discard.cancelled() => None,
            item = receiver.recv() => item,
        }
    }

    /// Drops every item still queued and returns how many there were.
    /// Intended for after a discard; consumers holding an item keep it.
    pub async fn drain(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        receiver.close();

        let mut dropped = 0;
        while receiver.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}
