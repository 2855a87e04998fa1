use super::config::{Config, Strategy};
use crate::buffer::BulkError;
use crate::domain::Message;
use crate::logger::{
    AsyncBulkLogger, AsyncLogger, AsyncPoolLogger, ConfigurationError, SyncBulkLogger, SyncLogger,
};
use crate::sender::{HttpTransport, Transport};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Key used for input lines that are not JSON objects.
pub const MESSAGE_KEY: &str = "message";

/// The logger selected by [`Strategy`].
#[derive(Debug)]
pub enum Dispatcher {
    Sync(SyncLogger),
    Async(AsyncLogger),
    Pool(AsyncPoolLogger),
    AsyncBulk(AsyncBulkLogger),
    SyncBulk(SyncBulkLogger),
}

impl Dispatcher {
    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        let transport = HttpTransport::new(config.client_config())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Must be called within a tokio runtime.
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigurationError> {
        let dispatcher = match config.strategy {
            Strategy::Sync => Dispatcher::Sync(SyncLogger::with_transport(transport)),
            Strategy::Async => Dispatcher::Async(AsyncLogger::with_transport(transport)),
            Strategy::Pool => Dispatcher::Pool(AsyncPoolLogger::with_transport(
                transport,
                config.workers,
                config.queue_size,
            )?),
            Strategy::AsyncBulk => Dispatcher::AsyncBulk(AsyncBulkLogger::with_transport(
                transport,
                config.bulk_byte_size_threshold,
                config.flush_interval_ms,
            )?),
            Strategy::SyncBulk => Dispatcher::SyncBulk(SyncBulkLogger::with_transport(
                transport,
                config.bulk_byte_size_threshold,
                config.flush_interval_ms,
            )?),
        };
        Ok(dispatcher)
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Dispatcher::Sync(_) => Strategy::Sync,
            Dispatcher::Async(_) => Strategy::Async,
            Dispatcher::Pool(_) => Strategy::Pool,
            Dispatcher::AsyncBulk(_) => Strategy::AsyncBulk,
            Dispatcher::SyncBulk(_) => Strategy::SyncBulk,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages handed to the logger.
    pub received: usize,
    /// Messages known not to have been delivered.
    pub undelivered: usize,
}

/// Feeds messages to a [`Dispatcher`] and tallies their outcomes.
pub struct Forwarder {
    dispatcher: Dispatcher,
    add_timestamp: bool,
    pending: FuturesUnordered<BoxFuture<'static, usize>>,
    summary: RunSummary,
}

impl Forwarder {
    pub fn new(dispatcher: Dispatcher, add_timestamp: bool) -> Self {
        Self {
            dispatcher,
            add_timestamp,
            pending: FuturesUnordered::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.dispatcher.strategy()
    }

    pub async fn forward(&mut self, mut message: Message) {
        if self.add_timestamp && message.timestamp().is_none() {
            message = message.with_timestamp(Utc::now());
        }
        self.summary.received += 1;

        match &self.dispatcher {
            Dispatcher::Sync(logger) => {
                if let Err(e) = logger.log(&message).await {
                    warn!(error = %e, "message not delivered");
                    self.summary.undelivered += 1;
                }
            }
            Dispatcher::Async(logger) => {
                let result = logger.log(&message);
                self.pending
                    .push(async move { usize::from(result.await.is_err()) }.boxed());
            }
            Dispatcher::Pool(logger) => {
                let result = logger.log(&message).await;
                self.pending
                    .push(async move { usize::from(result.await.is_err()) }.boxed());
            }
            Dispatcher::AsyncBulk(logger) => {
                let result = logger.log(&message);
                self.pending
                    .push(async move { result.await.err().map_or(0, undelivered) }.boxed());
            }
            Dispatcher::SyncBulk(logger) => {
                if let Err(e) = logger.log(&message).await {
                    self.summary.undelivered += undelivered(e);
                }
            }
        }

        self.reap();
    }

    /// Forwards every line of `reader`, then shuts the logger down.
    pub async fn run<R>(mut self, reader: R) -> std::io::Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(message) = parse_line(&line) {
                self.forward(message).await;
            }
        }

        Ok(self.finish().await)
    }

    /// Shuts the logger down and waits for every outstanding outcome.
    pub async fn finish(mut self) -> RunSummary {
        info!(strategy = ?self.dispatcher.strategy(), "input exhausted, shutting down");

        match &self.dispatcher {
            Dispatcher::Sync(_) | Dispatcher::Async(_) => {}
            Dispatcher::Pool(logger) => logger.shutdown().wait().await,
            Dispatcher::AsyncBulk(logger) => {
                if let Err(e) = logger.shutdown().await {
                    self.summary.undelivered += undelivered(e);
                }
            }
            Dispatcher::SyncBulk(logger) => {
                if let Err(e) = logger.shutdown().await {
                    self.summary.undelivered += undelivered(e);
                }
            }
        }

        while let Some(failed) = self.pending.next().await {
            self.summary.undelivered += failed;
        }

        debug!(
            received = self.summary.received,
            undelivered = self.summary.undelivered,
            "forwarder finished"
        );
        self.summary
    }

    fn reap(&mut self) {
        while let Some(Some(failed)) = self.pending.next().now_or_never() {
            self.summary.undelivered += failed;
        }
    }
}

/// Failed lines of a bulk outcome, or one for a message refused on its own.
fn undelivered(error: BulkError) -> usize {
    if error.failed_messages.is_empty() {
        warn!(error = %error.error, "message refused");
        1
    } else {
        warn!(
            error = %error.error,
            dropped = error.failed_messages.len(),
            "bulk payload not delivered"
        );
        error.failed_messages.len()
    }
}

/// JSON objects are forwarded as they are; any other non-blank line is
/// wrapped under [`MESSAGE_KEY`].
pub fn parse_line(line: &str) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(value @ Value::Object(_)) => Message::try_from(value).ok(),
        _ => Some(Message::new().with(MESSAGE_KEY, line)),
    }
}
