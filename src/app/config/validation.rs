use super::{Config, ConfigError};
use crate::buffer::validate_bulk_byte_size_threshold;
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Token must not be empty".to_string(),
            ));
        }

        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ConfigError::InvalidConfig(
                "Tags must not be blank".to_string(),
            ));
        }

        // The host ends up inside the endpoint URL
        let endpoint = format!("https://{}/", self.host);
        let parsed = Url::parse(&endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid host '{}': {}", self.host, e)))?;
        if parsed.path() != "/" || parsed.query().is_some() {
            return Err(ConfigError::InvalidUrl(format!(
                "Host '{}' must not contain a path",
                self.host
            )));
        }

        // Only the bulk loggers read the threshold
        if self.strategy.is_bulk() {
            validate_bulk_byte_size_threshold(self.bulk_byte_size_threshold)?;
        }

        if self.workers == 0 {
            return Err(ConfigError::InvalidConfig(
                "Pool workers must be greater than 0".to_string(),
            ));
        }

        if self.queue_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Pool queue size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
