use crate::buffer::BulkError;
use crate::domain::LogError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::warn;

/// Write side of a result handle. Consumed on completion, so a handle is
/// written at most once.
#[derive(Debug)]
pub(crate) struct Completion<T> {
    sender: oneshot::Sender<T>,
}

impl<T> Completion<T> {
    pub(crate) fn complete(self, outcome: T) {
        // The caller is free to drop its handle without reading it.
        let _ = self.sender.send(outcome);
    }
}

/// Outcome of a single asynchronously dispatched message.
///
/// Await it to get the delivery outcome. A message refused before dispatch
/// (serialization failure, shutdown in progress) resolves immediately and
/// also reports the error through [`foreground_error`](Self::foreground_error).
#[must_use = "the delivery outcome is only observable through this handle"]
#[derive(Debug)]
pub struct AsyncResult {
    receiver: oneshot::Receiver<Result<(), LogError>>,
    foreground: Option<LogError>,
}

impl AsyncResult {
    pub(crate) fn pending() -> (Completion<Result<(), LogError>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            Completion { sender },
            Self {
                receiver,
                foreground: None,
            },
        )
    }

    pub(crate) fn rejected(error: LogError) -> Self {
        let (completion, mut result) = Self::pending();
        completion.complete(Err(error.clone()));
        result.foreground = Some(error);
        result
    }

    /// Error raised before the message was handed to a background task.
    pub fn foreground_error(&self) -> Option<&LogError> {
        self.foreground.as_ref()
    }

    /// Non-blocking peek. `None` while the send is still in flight.
    pub fn try_outcome(&mut self) -> Option<Result<(), LogError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(LogError::Discarded)),
        }
    }
}

impl Future for AsyncResult {
    type Output = Result<(), LogError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(LogError::Discarded)))
    }
}

/// Outcome of a bulk-buffered call: success, or the error together with the
/// exact lines that were not delivered.
///
/// Resolving to `Ok` right after a `log` call usually only means the message
/// was buffered.
#[must_use = "failed messages are only observable through this handle"]
#[derive(Debug)]
pub struct AsyncBulkResult {
    receiver: oneshot::Receiver<Result<(), BulkError>>,
    foreground: Option<LogError>,
}

impl AsyncBulkResult {
    pub(crate) fn pending() -> (Completion<Result<(), BulkError>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            Completion { sender },
            Self {
                receiver,
                foreground: None,
            },
        )
    }

    pub(crate) fn rejected(error: LogError) -> Self {
        let (completion, mut result) = Self::pending();
        completion.complete(Err(BulkError::refused(error.clone())));
        result.foreground = Some(error);
        result
    }

    /// Error raised before the message reached the buffer.
    pub fn foreground_error(&self) -> Option<&LogError> {
        self.foreground.as_ref()
    }

    pub fn try_outcome(&mut self) -> Option<Result<(), BulkError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(BulkError::refused(LogError::Discarded))),
        }
    }
}

impl Future for AsyncBulkResult {
    type Output = Result<(), BulkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or_else(|_| Err(BulkError::refused(LogError::Discarded))))
    }
}

/// Completion of a background shutdown.
#[derive(Debug)]
pub struct ShutdownHandle {
    task: JoinHandle<()>,
}

impl ShutdownHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until every worker has stopped.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "shutdown task did not complete cleanly");
        }
    }
}
