use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::poller::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "https://openapi.liblibai.cloud";
pub const DEFAULT_TEXT2IMG_ENDPOINT: &str = "/api/generate/webui/text2img/ultra";
pub const DEFAULT_STATUS_ENDPOINT: &str = "/api/generate/webui/status";

/// Credentials and endpoints of the downstream image API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: String,
    pub text2img_endpoint: String,
    pub status_endpoint: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_consecutive_errors: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub poll: PollConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            access_key: None,
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text2img_endpoint: DEFAULT_TEXT2IMG_ENDPOINT.to_string(),
            status_endpoint: DEFAULT_STATUS_ENDPOINT.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        ApiConfig {
            access_key: env::var("LIBLIB_ACCESS_KEY").ok(),
            secret_key: env::var("LIBLIB_SECRET_KEY").ok(),
            base_url: env::var("LIBLIB_BASE_URL").unwrap_or(defaults.base_url),
            text2img_endpoint: env::var("LIBLIB_TEXT2IMG_ENDPOINT")
                .unwrap_or(defaults.text2img_endpoint),
            status_endpoint: env::var("LIBLIB_STATUS_ENDPOINT")
                .unwrap_or(defaults.status_endpoint),
            timeout: env::var("LIBLIB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .or(defaults.timeout),
        }
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_endpoints(
        mut self,
        text2img: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        self.text2img_endpoint = text2img.into();
        self.status_endpoint = status.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            static_dir: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        ServerConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval_ms: 1000,
            max_attempts: None,
            timeout_secs: Some(300),
            max_consecutive_errors: 5,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        PollConfig {
            interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.interval_ms),
            max_attempts: env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(defaults.max_attempts),
            timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(defaults.timeout_secs),
            max_consecutive_errors: env::var("POLL_MAX_ERRORS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_consecutive_errors),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        let mut policy = PollPolicy::new()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_max_consecutive_errors(self.max_consecutive_errors);
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.timeout_secs {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        policy
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            api: ApiConfig::from_env(),
            server: ServerConfig::from_env(),
            poll: PollConfig::from_env(),
        }
    }

    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.status_endpoint, "/api/generate/webui/status");
        assert!(!config.has_credentials());

        let config = config.with_credentials("ak", "sk");
        assert!(config.has_credentials());
    }

    #[test]
    fn test_server_builder() {
        let config = ServerConfig::new()
            .with_address("0.0.0.0", 8080)
            .with_static_dir("/srv/www");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_poll_policy_from_config() {
        let config = PollConfig {
            interval_ms: 250,
            max_attempts: Some(10),
            timeout_secs: None,
            max_consecutive_errors: 2,
        };
        let policy = config.policy();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, Some(10));
        assert_eq!(policy.timeout, None);
        assert_eq!(policy.max_consecutive_errors, 2);
    }
}
