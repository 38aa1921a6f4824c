//! Construction-time settings for `TypesenseClient`.

use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8108";

/// Base URL, API key and transport timeout. Fixed once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Global per-request timeout handed to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            api_key: String::new(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// An empty `base_url` selects `DEFAULT_SERVER_URL`. A trailing slash is
    /// stripped so paths can always start with `/`.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            base_url: if base_url.is_empty() {
                DEFAULT_SERVER_URL.to_string()
            } else {
                base_url.to_string()
            },
            api_key: api_key.to_string(),
            timeout: None,
        }
    }

    /// Read `TYPESENSE_URL`, `TYPESENSE_API_KEY` and `TYPESENSE_TIMEOUT_MS`.
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TYPESENSE_URL").unwrap_or_default();
        let api_key = std::env::var("TYPESENSE_API_KEY").unwrap_or_default();
        let timeout = std::env::var("TYPESENSE_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis);

        Self {
            timeout,
            ..Self::new(&base_url, &api_key)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
