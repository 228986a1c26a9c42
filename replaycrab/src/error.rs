use std::time::Duration;
use thiserror::Error;

/// Errors produced while fetching, throttling or encoding replays
///
/// # Variants
///
/// - [`RemoteUnavailable`](ReplayError::RemoteUnavailable): the remote service could not be reached
/// - [`RemoteRejection`](ReplayError::RemoteRejection): the remote service answered with an error payload
/// - [`MissingField`](ReplayError::MissingField): a record lacks a field the replay format needs
/// - [`InconsistentRecord`](ReplayError::InconsistentRecord): beatmap and score records disagree
/// - [`EncodingRange`](ReplayError::EncodingRange): a value does not fit its fixed-width field
/// - [`MalformedField`](ReplayError::MalformedField): a field is present but cannot be interpreted
/// - [`Throttled`](ReplayError::Throttled): a non-blocking throttle check was rejected
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote service rejected the request: {0}")]
    RemoteRejection(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("inconsistent records: {0}")]
    InconsistentRecord(String),

    #[error("value {value} out of range for field {field}")]
    EncodingRange { field: &'static str, value: i128 },

    #[error("malformed field {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("operation {operation} throttled, retry after {retry_after:?}")]
    Throttled {
        operation: String,
        retry_after: Duration,
    },
}

pub type Result<T> = std::result::Result<T, ReplayError>;
