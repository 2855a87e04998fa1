pub use crate::domain::ThresholdError;

/// Largest accepted bulk payload, nearly the 5MB limit of the bulk endpoint.
pub const MAX_BULK_BYTE_SIZE_THRESHOLD: usize = 5 * 1024 * 1024;

/// Checks a configured bulk byte size threshold before anything starts.
pub fn validate_bulk_byte_size_threshold(given: i64) -> Result<usize, ThresholdError> {
    if given <= 0 {
        return Err(ThresholdError::NotNatural { given });
    }

    let exceeded = ThresholdError::Exceeded {
        maximum: MAX_BULK_BYTE_SIZE_THRESHOLD,
        given,
    };
    let threshold = usize::try_from(given).map_err(|_| exceeded.clone())?;
    if threshold > MAX_BULK_BYTE_SIZE_THRESHOLD {
        return Err(exceeded);
    }

    Ok(threshold)
}
