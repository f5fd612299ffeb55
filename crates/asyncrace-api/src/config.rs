//! Backend client configuration.

use std::time::Duration;

use asyncrace_errors::ApiError;

/// Configuration shared by all backend clients.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the mock backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout applied at the HTTP client level.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub(crate) fn client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("asyncrace/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))
    }
}
