use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    client::GenerationApi,
    config::ApiConfig,
    error::{ProxyError, Result},
    logger,
    models::{DownstreamResponse, GenerateRequest, GenerateResponse, StatusQuery, StatusSnapshot},
    signer::RequestSigner,
};

/// Client for the downstream image API. Every call carries a freshly signed URL.
#[derive(Clone, Debug)]
pub struct LiblibClient {
    http: Client,
    signer: RequestSigner,
    text2img_endpoint: String,
    status_endpoint: String,
}

impl LiblibClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let signer = RequestSigner::from_config(&config)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ProxyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            signer,
            text2img_endpoint: config.text2img_endpoint,
            status_endpoint: config.status_endpoint,
        })
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    async fn post_signed<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Signing fails on an empty endpoint, so nothing is sent in that case.
        let url = self.signer.full_api_url(endpoint)?;
        let _timer = logger::timer(&format!("POST {}", endpoint));

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProxyError::RequestError(format!("Request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                text
            };
            log::warn!("Downstream {} answered {}: {}", endpoint, status, message);
            return Err(ProxyError::Downstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: DownstreamResponse<T> = response
            .json()
            .await
            .map_err(|e| ProxyError::ResponseError(format!("Invalid response from {}: {}", endpoint, e)))?;
        body.into_result()
    }
}

#[async_trait]
impl GenerationApi for LiblibClient {
    async fn submit(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        log::info!("Submitting text-to-image task (template {})", request.template_uuid);
        let handle: GenerateResponse = self.post_signed(&self.text2img_endpoint, request).await?;
        log::info!("Task created: {}", handle.generate_uuid);
        Ok(handle)
    }

    async fn poll(&self, generate_uuid: &str) -> Result<StatusSnapshot> {
        log::debug!("Querying status of {}", generate_uuid);
        self.post_signed(&self.status_endpoint, &StatusQuery { generate_uuid })
            .await
    }
}
