// Client configuration: where the backend lives

use thiserror::Error;
use url::Url;

// Environment variable holding the backend base URL
pub const BASE_URL_ENV: &str = "API_BASE_URL";

// Local development backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

#[derive(Error, Debug, PartialEq)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read the base URL from `API_BASE_URL`, falling back to the local
    /// development address when it is unset or empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Same policy as `from_env`, over any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(BASE_URL_ENV) {
            Some(base_url) if !base_url.is_empty() => Self { base_url },
            _ => Self::default(),
        }
    }

    // The base URL must be an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ClientError> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            ClientError::ConfigError(format!("invalid base URL {:?}: {}", self.base_url, e))
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::ConfigError(format!(
                "unsupported scheme {:?} in base URL {:?}",
                other, self.base_url
            ))),
        }
    }
}
