//! Domain layer for rask-log-client.
//!
//! Contains the canonical types shared across all modules:
//! - `Message`: The key/value envelope callers log
//! - `LogError`: Outcome error delivered through every result handle
//! - `ThresholdError`: Rejected bulk configuration

pub mod error;
pub mod message;

pub use error::{LogError, ThresholdError};
pub use message::{Message, TIMESTAMP_KEY, serialize_line};
