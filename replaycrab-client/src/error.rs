use replaycrab::ReplayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid replay encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Missing API key")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for ReplayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => ReplayError::RemoteUnavailable(e.to_string()),
            ClientError::Status(status) => ReplayError::RemoteUnavailable(status.to_string()),
            ClientError::Api(message) => ReplayError::RemoteRejection(message),
            ClientError::InvalidField { field, value } => {
                ReplayError::MalformedField { field, value }
            }
            other => ReplayError::RemoteRejection(other.to_string()),
        }
    }
}
