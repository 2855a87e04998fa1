use super::env::{load_env_enum, load_env_list, load_env_string, load_env_var};
use super::{ConfigError, LogLevel, Strategy};
use crate::sender::{ClientConfig, http::DEFAULT_HOST};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Customer token of the ingestion endpoint
    #[arg(long, env = "RASK_LOG_TOKEN", default_value = "")]
    pub token: String,

    /// Routing tags, comma separated
    #[arg(long, env = "RASK_LOG_TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Ingestion host
    #[arg(long, env = "RASK_LOG_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Use https for the ingestion endpoint
    #[arg(
        long,
        env = "RASK_LOG_USE_HTTPS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub use_https: bool,

    /// Dispatch strategy
    #[arg(long, env = "RASK_LOG_STRATEGY", value_enum, default_value = "async-bulk")]
    pub strategy: Strategy,

    /// Bulk payload size that triggers a flush, in bytes
    #[arg(long, env = "BULK_BYTE_SIZE_THRESHOLD", default_value = "1048576")]
    pub bulk_byte_size_threshold: i64,

    /// Periodic bulk flush interval in milliseconds (0 disables it)
    #[arg(long, env = "FLUSH_INTERVAL_MS", default_value = "5000")]
    pub flush_interval_ms: i64,

    /// Number of pool workers
    #[arg(long, env = "POOL_WORKERS", default_value = "4")]
    pub workers: usize,

    /// Pool queue capacity
    #[arg(long, env = "POOL_QUEUE_SIZE", default_value = "1024")]
    pub queue_size: usize,

    /// HTTP request timeout in seconds (0 means no timeout)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Add a timestamp to lines that carry none
    #[arg(
        long,
        env = "ADD_TIMESTAMP",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub add_timestamp: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Configuration file path (optional). When given, the file replaces
    /// every other flag and environment variable
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            tags: Vec::new(),
            host: DEFAULT_HOST.to_string(),
            use_https: true,
            strategy: Strategy::AsyncBulk,
            bulk_byte_size_threshold: 1_048_576,
            flush_interval_ms: 5000,
            workers: 4,
            queue_size: 1024,
            request_timeout_secs: 30,
            add_timestamp: true,
            log_level: LogLevel::Info,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses command line flags with environment fallbacks.
    ///
    /// With `--config-file` the TOML file is the whole configuration: flags
    /// and environment variables given alongside it are ignored. `--help`,
    /// `--version` and bad flags come back as [`ConfigError::Cli`].
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)?;
        let config = match &config.config_file {
            Some(path) => Self::from_file(path)?,
            None => config,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string("RASK_LOG_TOKEN", &mut config.token);
        load_env_list("RASK_LOG_TAGS", &mut config.tags);
        load_env_string("RASK_LOG_HOST", &mut config.host);
        load_env_var("RASK_LOG_USE_HTTPS", &mut config.use_https)?;
        load_env_enum("RASK_LOG_STRATEGY", &mut config.strategy)?;
        load_env_var("BULK_BYTE_SIZE_THRESHOLD", &mut config.bulk_byte_size_threshold)?;
        load_env_var("FLUSH_INTERVAL_MS", &mut config.flush_interval_ms)?;
        load_env_var("POOL_WORKERS", &mut config.workers)?;
        load_env_var("POOL_QUEUE_SIZE", &mut config.queue_size)?;
        load_env_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_var("ADD_TIMESTAMP", &mut config.add_timestamp)?;
        load_env_enum("LOG_LEVEL", &mut config.log_level)?;

        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file. Keys left out keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Transport settings for the loggers.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            tags: self.tags.clone(),
            token: self.token.clone(),
            use_https: self.use_https,
            host: self.host.clone(),
            timeout: self.request_timeout(),
            ..ClientConfig::default()
        }
    }
}
