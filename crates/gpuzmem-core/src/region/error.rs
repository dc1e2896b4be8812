use thiserror::Error;

use crate::source::SourceError;

/// Errors returned by region decoding.
///
/// # Examples
/// ```
/// use gpuzmem_core::DecodeError;
///
/// let err = DecodeError::NoData;
/// assert!(err.is_no_data());
/// assert!(err.to_string().contains("producer likely not running"));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("region unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
    #[error(
        "short read at offset {offset} ({field}): need {needed} bytes, {remaining} remaining"
    )]
    ShortRead {
        field: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("initialization failed: empty records and sensors, producer likely not running")]
    NoData,
}

impl DecodeError {
    /// True when the region was read in full but carried no records or
    /// sensors, i.e. the producer is attached but idle.
    pub fn is_no_data(&self) -> bool {
        matches!(self, DecodeError::NoData)
    }
}
