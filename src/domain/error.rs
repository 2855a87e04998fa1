use thiserror::Error;

/// Rejected bulk byte size threshold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("bulk byte size threshold must be natural number [given: {given}]")]
    NotNatural { given: i64 },

    #[error("bulk byte size threshold is exceeded [maximum: {maximum}, given: {given}]")]
    Exceeded { maximum: usize, given: i64 },
}

/// Outcome error of a logging call.
///
/// Cloneable so that a refusal can be returned to the caller and mirrored
/// into the asynchronous result handle at the same time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("failed to serialize message: {0}")]
    Serialization(String),

    #[error("failed to call log API: {0}")]
    Transport(String),

    #[error("failed to call log API [status={status}, msg={body}]")]
    Status { status: u16, body: String },

    #[error("in progress to shutdown. refused the message")]
    ShuttingDown,

    #[error("message was discarded before it was sent")]
    Discarded,
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        LogError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = LogError::Status {
            status: 500,
            body: "NG".to_string(),
        };
        assert_eq!(err.to_string(), "failed to call log API [status=500, msg=NG]");
    }

    #[test]
    fn test_serde_error_is_serialization() {
        let err: LogError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, LogError::Serialization(_)));
    }

    #[test]
    fn test_threshold_error_message() {
        let err = ThresholdError::Exceeded {
            maximum: 5,
            given: 6,
        };
        assert_eq!(
            err.to_string(),
            "bulk byte size threshold is exceeded [maximum: 5, given: 6]"
        );
    }
}
