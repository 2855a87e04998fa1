pub mod config;
pub mod forwarder;
pub mod logging_system;

pub use config::{Config, ConfigError, LogLevel, Strategy};
pub use forwarder::{Dispatcher, Forwarder, RunSummary, parse_line};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging_safe};

use crate::logger::ConfigurationError;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

/// Stdin-to-endpoint forwarder.
pub struct App {
    config: Config,
    forwarder: Forwarder,
}

impl App {
    /// Builds the logger selected by the configuration. Must be called within
    /// a tokio runtime.
    pub fn from_config(config: Config) -> Result<Self, ConfigurationError> {
        let dispatcher = Dispatcher::from_config(&config)?;
        info!(
            version = crate::VERSION,
            strategy = ?config.strategy,
            host = %config.host,
            tags = ?config.tags,
            "starting rask-log-client"
        );
        if config.strategy.is_bulk() {
            info!(
                threshold = config.bulk_byte_size_threshold,
                flush_interval_ms = config.flush_interval_ms,
                "bulk buffering enabled"
            );
        } else if config.strategy == Strategy::Pool {
            info!(
                workers = config.workers,
                queue_size = config.queue_size,
                "worker pool enabled"
            );
        }

        Ok(Self {
            forwarder: Forwarder::new(dispatcher, config.add_timestamp),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run<R>(self, reader: R) -> std::io::Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let summary = self.forwarder.run(reader).await?;
        info!(
            received = summary.received,
            undelivered = summary.undelivered,
            "rask-log-client stopped"
        );
        Ok(summary)
    }

    pub async fn run_stdin(self) -> std::io::Result<RunSummary> {
        self.run(BufReader::new(tokio::io::stdin())).await
    }
}
