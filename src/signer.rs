use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::{Alphanumeric, DistString};
use sha1::Sha1;

use crate::{
    config::ApiConfig,
    error::{ProxyError, Result},
};

type HmacSha1 = Hmac<Sha1>;

pub const NONCE_LENGTH: usize = 16;

/// A URL together with the authentication parameters computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub access_key: String,
    pub signature: String,
    pub timestamp: i64,
    pub nonce: String,
}

impl SignedRequest {
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("AccessKey", self.access_key.clone()),
            ("Signature", self.signature.clone()),
            ("Timestamp", self.timestamp.to_string()),
            ("SignatureNonce", self.nonce.clone()),
        ]
    }

    /// The original URL with the four authentication parameters appended.
    pub fn to_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish();
        format!("{}{}{}", self.url, separator, query)
    }
}

#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    base_url: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RequestSigner {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let access_key = config
            .access_key
            .clone()
            .ok_or_else(|| ProxyError::ConfigError("API access key is required".into()))?;
        let secret_key = config
            .secret_key
            .clone()
            .ok_or_else(|| ProxyError::ConfigError("API secret key is required".into()))?;

        Ok(Self::new(access_key, secret_key, config.base_url.clone()))
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Signs `url` with the current time and a fresh nonce.
    pub fn sign(&self, url: &str) -> Result<SignedRequest> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let nonce = generate_nonce();
        self.sign_with(url, timestamp, &nonce)
    }

    /// Deterministic signing: same inputs and secret always give the same signature.
    pub fn sign_with(&self, url: &str, timestamp: i64, nonce: &str) -> Result<SignedRequest> {
        if url.is_empty() {
            return Err(ProxyError::SigningError("URL cannot be empty".into()));
        }

        let payload = format!("{}&{}&{}", url, timestamp, nonce);
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ProxyError::SigningError(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(SignedRequest {
            url: url.to_string(),
            access_key: self.access_key.clone(),
            signature,
            timestamp,
            nonce: nonce.to_string(),
        })
    }

    pub fn signed_url(&self, url: &str) -> Result<String> {
        Ok(self.sign(url)?.to_url())
    }

    /// Base URL followed by the signed endpoint path.
    pub fn full_api_url(&self, endpoint: &str) -> Result<String> {
        let signed = self.signed_url(endpoint)?;
        Ok(format!("{}{}", self.base_url, signed))
    }
}

pub fn generate_nonce() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), NONCE_LENGTH)
}
