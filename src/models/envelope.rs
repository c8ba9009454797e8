use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// Uniform response body of every proxy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details: Some(details.into()),
        }
    }

    /// Unwraps a successful envelope, turning a failed one into an error.
    pub fn into_result(self, status: u16) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ProxyError::ResponseError(
                "successful response carried no data".into(),
            )),
            (false, _) => {
                let message = match (self.error, self.details) {
                    (Some(error), Some(details)) => format!("{}: {}", error, details),
                    (Some(error), None) => error,
                    (None, Some(details)) => details,
                    (None, None) => "unknown error".to_string(),
                };
                Err(ProxyError::Downstream { status, message })
            }
        }
    }
}

/// Body shape of the downstream image API.
#[derive(Debug, Clone, Deserialize)]
pub struct DownstreamResponse<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> DownstreamResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if self.code != 0 {
            return Err(ProxyError::ApiError {
                code: self.code,
                message: self.msg,
            });
        }
        self.data.ok_or_else(|| {
            ProxyError::ResponseError("downstream response carried no data".into())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub server_time: String,
    pub service: String,
    pub version: String,
}

impl HealthReport {
    pub fn now(service: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            status: "ok".to_string(),
            message: "Server connection is healthy".to_string(),
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            server_time: chrono::Local::now().to_rfc2822(),
            service: service.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
