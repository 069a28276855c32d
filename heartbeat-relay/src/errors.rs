use crate::config::ValidationError;
use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur while relaying a request
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid backend URL for {0}: {1}")]
    InvalidBackendUrl(String, url::ParseError),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("Failed to read response body: {0}")]
    ResponseBodyError(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("No response from primary backend")]
    PrimaryUnavailable,

    #[error("Backend task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Status code reported to the caller when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::RequestBodyError(_) | RelayError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error was produced while talking to a backend.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidBackendUrl(..)
                | RelayError::UpstreamRequestFailed(..)
                | RelayError::UpstreamTimeout(_)
                | RelayError::ResponseBodyError(_)
                | RelayError::HttpClientError(_)
                | RelayError::TaskFailed(_)
        )
    }
}
