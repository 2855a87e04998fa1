use super::ConfigurationError;
use super::result::AsyncResult;
use crate::domain::serialize_line;
use crate::sender::{ClientConfig, HttpTransport, Transport, classify};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Spawns one task per message.
///
/// There is no admission control: every call spawns a task and opens a
/// request regardless of how many are already in flight. Callers are
/// responsible for throttling; use [`AsyncPoolLogger`](super::AsyncPoolLogger)
/// to bound concurrency instead. Completion order across calls is
/// unspecified.
#[derive(Clone)]
pub struct AsyncLogger {
    transport: Arc<dyn Transport>,
}

impl AsyncLogger {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigurationError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Serializes on the calling task, then sends in the background.
    ///
    /// Must be called within a tokio runtime.
    pub fn log<M: Serialize + ?Sized>(&self, message: &M) -> AsyncResult {
        let line = match serialize_line(message) {
            Ok(line) => line,
            Err(e) => return AsyncResult::rejected(e),
        };

        let (completion, result) = AsyncResult::pending();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let outcome = classify(transport.send(line).await);
            if let Err(e) = &outcome {
                debug!(error = %e, "event delivery failed");
            }
            completion.complete(outcome);
        });

        result
    }
}

impl std::fmt::Debug for AsyncLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLogger").finish_non_exhaustive()
    }
}
