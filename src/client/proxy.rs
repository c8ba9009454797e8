use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::{
    client::GenerationApi,
    error::{ProxyError, Result},
    models::{ApiResponse, GenerateRequest, GenerateResponse, HealthReport, StatusSnapshot},
};

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001/api";

/// Client for this crate's own HTTP server, as used by a front end.
#[derive(Clone, Debug)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl Default for ProxyClient {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_URL)
    }
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthReport> {
        let response = self.http.get(self.endpoint(&["health"])?).send().await?;
        Self::unwrap_envelope(response).await
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ProxyError::ConfigError(format!("Invalid proxy URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| ProxyError::ConfigError(format!("Invalid proxy URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(envelope) => envelope.into_result(status),
            Err(_) if !(200..300).contains(&status) => Err(ProxyError::Downstream {
                status,
                message: text,
            }),
            Err(e) => Err(ProxyError::ResponseError(format!(
                "Invalid response format: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl GenerationApi for ProxyClient {
    async fn submit(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .http
            .post(self.endpoint(&["generate"])?)
            .json(request)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn poll(&self, generate_uuid: &str) -> Result<StatusSnapshot> {
        if generate_uuid.is_empty() {
            return Err(ProxyError::RequestError("task uuid cannot be empty".into()));
        }
        let response = self
            .http
            .get(self.endpoint(&["status", generate_uuid])?)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }
}
