use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    /// Downstream answered with a non-success HTTP status.
    #[error("Downstream error ({status}): {message}")]
    Downstream { status: u16, message: String },

    /// Downstream answered 200 but flagged the call as failed in its body.
    #[error("API error (code {code}): {message}")]
    ApiError { code: i64, message: String },

    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Polling timed out after {attempts} attempts ({elapsed:?})")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("Generation failed: {0}")]
    PollFailed(String),

    #[error("Polling cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProxyError {
    /// HTTP status the proxy answers with when this error ends a request.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::Downstream { status, .. } => *status,
            ProxyError::SigningError(_) => 400,
            ProxyError::ApiError { .. } | ProxyError::ResponseError(_) => 502,
            ProxyError::PollTimeout { .. } => 504,
            _ => 500,
        }
    }

    /// Whether a poller may try again after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            ProxyError::RequestError(_) | ProxyError::ResponseError(_) => true,
            ProxyError::Downstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProxyError::Downstream {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => ProxyError::ResponseError(err.to_string()),
            None => ProxyError::RequestError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
