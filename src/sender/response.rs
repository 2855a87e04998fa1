use super::transport::{TransportError, TransportResponse};
use crate::domain::LogError;

/// Classifies a completed response: 200..=299 succeeds, anything else fails
/// with the response body attached.
pub fn check_response(response: &TransportResponse) -> Result<(), LogError> {
    if response.is_success() {
        return Ok(());
    }

    Err(LogError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Folds a transport outcome into a delivery outcome. A transport error wins
/// over any status.
pub fn classify(result: Result<TransportResponse, TransportError>) -> Result<(), LogError> {
    match result {
        Ok(response) => check_response(&response),
        Err(e) => Err(LogError::Transport(e.to_string())),
    }
}
