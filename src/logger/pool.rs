use super::ConfigurationError;
use super::lifecycle::{Lifecycle, LifecycleState};
use super::result::{AsyncResult, Completion, ShutdownHandle};
use crate::buffer::{JobQueue, QueueClosed, QueueReceiver};
use crate::domain::{LogError, serialize_line};
use crate::sender::{ClientConfig, HttpTransport, Transport, classify};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often a graceful shutdown checks whether the queue has drained.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Job {
    line: Bytes,
    completion: Completion<Result<(), LogError>>,
}

/// Delivers messages through a fixed pool of workers fed by a bounded queue.
///
/// `log` only enqueues. When the queue is full it waits until a worker
/// frees a slot, so the queue capacity must be sized for the expected
/// throughput. At most `workers` requests are in flight at any time.
pub struct AsyncPoolLogger {
    queue: Arc<JobQueue<Job>>,
    receiver: Arc<QueueReceiver<Job>>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    worker_count: usize,
    lifecycle: Arc<Lifecycle>,
}

impl AsyncPoolLogger {
    pub fn new(
        config: ClientConfig,
        workers: usize,
        queue_size: usize,
    ) -> Result<Self, ConfigurationError> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(Arc::new(transport), workers, queue_size)
    }

    /// Spawns the workers. Must be called within a tokio runtime.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        workers: usize,
        queue_size: usize,
    ) -> Result<Self, ConfigurationError> {
        if workers == 0 {
            return Err(ConfigurationError::Pool(
                "worker count must be greater than 0".to_string(),
            ));
        }
        if queue_size == 0 {
            return Err(ConfigurationError::Pool(
                "queue size must be greater than 0".to_string(),
            ));
        }

        let (queue, receiver) = JobQueue::bounded(queue_size);
        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&receiver), Arc::clone(&transport))))
            .collect();

        info!(workers, queue_size, "worker pool started");

        Ok(Self {
            queue,
            receiver,
            workers: Arc::new(Mutex::new(handles)),
            worker_count: workers,
            lifecycle: Arc::new(Lifecycle::new(None)),
        })
    }

    /// Enqueues a message, waiting while the queue is full.
    ///
    /// Serialization failures and shutdown refusals resolve the handle
    /// immediately and are also reported by
    /// [`AsyncResult::foreground_error`].
    pub async fn log<M: Serialize + ?Sized>(&self, message: &M) -> AsyncResult {
        if let Err(e) = self.lifecycle.ensure_active() {
            return AsyncResult::rejected(e);
        }

        let line = match serialize_line(message) {
            Ok(line) => line,
            Err(e) => return AsyncResult::rejected(e),
        };

        let (completion, result) = AsyncResult::pending();
        match self.queue.push(Job { line, completion }).await {
            Ok(()) => result,
            // Closed between the active check and the push.
            Err(QueueClosed(_job)) => AsyncResult::rejected(LogError::ShuttingDown),
        }
    }

    /// Graceful shutdown.
    ///
    /// Refuses new messages at once, then in the background waits for the
    /// queue to drain, closes it and joins every worker. This can take as
    /// long as the queued sends do; use [`shutdown_force`](Self::shutdown_force)
    /// when a deadline matters.
    pub fn shutdown(&self) -> ShutdownHandle {
        let _ = self.lifecycle.begin_shutdown();

        let queue = Arc::clone(&self.queue);
        let workers = std::mem::take(&mut *self.workers.lock());
        let lifecycle = Arc::clone(&self.lifecycle);

        ShutdownHandle::new(tokio::spawn(async move {
            while !queue.is_empty() {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
            queue.close();

            join_workers(workers).await;
            lifecycle.finish_shutdown();
        }))
    }

    /// Forced shutdown.
    ///
    /// Closes the queue immediately and drops every message still queued;
    /// their handles resolve to [`LogError::Discarded`] without waiting for
    /// the workers. Workers already holding a message finish that one send.
    /// The returned handle completes once they have.
    pub fn shutdown_force(&self) -> ShutdownHandle {
        let _ = self.lifecycle.begin_shutdown();
        self.queue.discard();

        let receiver = Arc::clone(&self.receiver);
        let workers = std::mem::take(&mut *self.workers.lock());
        let lifecycle = Arc::clone(&self.lifecycle);

        ShutdownHandle::new(tokio::spawn(async move {
            let discarded = receiver.drain().await;
            if discarded > 0 {
                warn!(discarded, "forced shutdown dropped queued messages");
            }

            join_workers(workers).await;
            lifecycle.finish_shutdown();
        }))
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Messages waiting for a worker.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queue_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl std::fmt::Debug for AsyncPoolLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncPoolLogger")
            .field("worker_count", &self.worker_count)
            .field("queue_capacity", &self.queue.capacity())
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

async fn run_worker(id: usize, queue: Arc<QueueReceiver<Job>>, transport: Arc<dyn Transport>) {
    debug!(worker = id, "worker started");

    while let Some(job) = queue.recv().await {
        let outcome = classify(transport.send(job.line).await);
        if let Err(e) = &outcome {
            debug!(worker = id, error = %e, "event delivery failed");
        }
        job.completion.complete(outcome);
    }

    debug!(worker = id, "queue closed, worker stopped");
}

async fn join_workers(workers: Vec<JoinHandle<()>>) {
    for handle in workers {
        if let Err(e) = handle.await {
            warn!(error = %e, "worker terminated abnormally");
        }
    }
}
