//! Hub connection configuration.
//!
//! Nothing here is read from the environment or filled in behind the
//! caller's back: the caller builds a [`HubConfig`] explicitly, and the
//! defaults it starts from are the public constants below.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default bound on the connection health wait.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(20);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default consumer registry page size.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Settings for connecting to a hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Base URL of the hub API, e.g. `https://hub.example.com`.
    pub hub_url: String,
    /// Identity this client publishes works under.
    pub source_id: String,
    /// How long to wait for the hub to report healthy before giving up.
    pub health_timeout: Duration,
    /// Upper bound for each request.
    pub request_timeout: Duration,
    /// Skip TLS certificate verification.
    pub insecure_skip_verify: bool,
    /// Maximum consumers fetched from the registry in one listing.
    pub page_size: usize,
}

impl HubConfig {
    /// Create a config with the default timeouts and page size.
    pub fn new(hub_url: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            hub_url: hub_url.into(),
            source_id: source_id.into(),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            insecure_skip_verify: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Hub URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.hub_url.trim_end_matches('/')
    }

    /// Check that every required field is usable.
    pub fn validate(&self) -> Result<()> {
        if self.hub_url.trim().is_empty() {
            return Err(Error::Config("hub URL is required".to_string()));
        }
        if !self.hub_url.starts_with("http://") && !self.hub_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "hub URL must start with http:// or https://, got {:?}",
                self.hub_url
            )));
        }
        if self.source_id.trim().is_empty() {
            return Err(Error::Config("source id is required".to_string()));
        }
        if self.health_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = HubConfig::new("https://hub.example.com", "workcast");
        assert_eq!(config.health_timeout, Duration::from_secs(20));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.page_size, 1000);
        assert!(!config.insecure_skip_verify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = HubConfig::new("http://localhost:8000", "ci")
            .health_timeout(Duration::from_secs(5))
            .request_timeout(Duration::from_secs(2))
            .insecure_skip_verify(true)
            .page_size(50);
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert!(config.insecure_skip_verify);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_base_url_trims_slash() {
        let config = HubConfig::new("https://hub.example.com/", "s");
        assert_eq!(config.base_url(), "https://hub.example.com");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(HubConfig::new("", "s").validate().is_err());
        assert!(HubConfig::new("hub.example.com", "s").validate().is_err());
        assert!(HubConfig::new("https://hub", " ").validate().is_err());
        assert!(
            HubConfig::new("https://hub", "s")
                .page_size(0)
                .validate()
                .is_err()
        );
        assert!(
            HubConfig::new("https://hub", "s")
                .health_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
