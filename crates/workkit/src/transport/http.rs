//! HTTP transport to a hub.
//!
//! Works live under `/api/v1/consumers/{consumer}/works`. Patches are sent as
//! JSON merge patches, and every request carries the configured source id in
//! the `X-Source-Id` header.

use crate::cancel::CancelToken;
use crate::config::HubConfig;
use crate::error::{Error, Operation, Result};
use crate::transport::{ConsumerRegistry, Transport};
use crate::types::{ConsumerDescriptor, WorkBundle, WorkRecord};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::thread;
use std::time::Duration;

/// Content type for merge patch bodies.
pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Header carrying the publishing source id.
pub const SOURCE_ID_HEADER: &str = "X-Source-Id";

/// Characters escaped in a URL path segment: everything except RFC 3986 unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Pause between health probes.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

type Response = ureq::http::Response<ureq::Body>;

/// What a request is about, for error context.
struct Target<'a> {
    operation: Operation,
    consumer: &'a str,
    name: Option<&'a str>,
}

/// Transport and consumer registry backed by a hub's HTTP API.
///
/// # Example
///
/// ```no_run
/// use workkit::transport::Transport;
/// use workkit::transport::http::HttpTransport;
/// use workkit::{CancelToken, HubConfig};
///
/// let config = HubConfig::new("https://hub.example.com", "workcast");
/// let cancel = CancelToken::new();
/// let transport = HttpTransport::connect(&config, &cancel).unwrap();
/// let works = transport.list(&cancel, "cluster-a").unwrap();
/// println!("{} works", works.len());
/// ```
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    source_id: String,
    user_agent: String,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport without contacting the hub.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config is invalid.
    pub fn new(config: &HubConfig) -> Result<Self> {
        config.validate()?;

        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(config.insecure_skip_verify)
            .build();
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(config.request_timeout))
                .tls_config(tls)
                .build(),
        );

        if config.insecure_skip_verify {
            log::warn!("TLS certificate verification is disabled for {}", config.base_url());
        }

        Ok(Self {
            agent,
            base_url: config.base_url().to_string(),
            source_id: config.source_id.clone(),
            user_agent: format!("workkit/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: config.request_timeout,
        })
    }

    /// Build a transport and wait for the hub to report healthy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the hub is not healthy within the
    /// configured health timeout, or `Error::Cancelled` if `cancel` fires first.
    pub fn connect(config: &HubConfig, cancel: &CancelToken) -> Result<Self> {
        let transport = Self::new(config)?;
        transport.wait_healthy(cancel, config.health_timeout)?;
        log::debug!("Connected to hub at {}", transport.base_url);
        Ok(transport)
    }

    /// Override the `User-Agent` sent with every request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll the health endpoint until it answers 2xx or `timeout` elapses.
    pub fn wait_healthy(&self, cancel: &CancelToken, timeout: Duration) -> Result<()> {
        let deadline = cancel.child_with_timeout(timeout);
        let mut last_error = String::from("no response");

        loop {
            cancel.check(Operation::HealthCheck)?;
            if deadline.is_cancelled() {
                return Err(Error::transport(
                    Operation::HealthCheck,
                    "",
                    None,
                    format!("hub not healthy after {timeout:?}: {last_error}"),
                    None,
                ));
            }

            let result = self.prepare(&deadline, self.agent.get(&self.health_url())).call();
            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => last_error = format!("HTTP {}", response.status().as_u16()),
                Err(e) => last_error = e.to_string(),
            }
            log::debug!("Hub health probe failed: {last_error}");

            let pause = deadline.bound(HEALTH_POLL_INTERVAL);
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }

    fn health_url(&self) -> String {
        format!("{}/healthz", self.base_url)
    }

    fn consumers_url(&self, page_size: usize) -> String {
        format!("{}/api/v1/consumers?size={page_size}", self.base_url)
    }

    fn works_url(&self, consumer: &str) -> String {
        format!(
            "{}/api/v1/consumers/{}/works",
            self.base_url,
            utf8_percent_encode(consumer, PATH_SEGMENT)
        )
    }

    fn work_url(&self, consumer: &str, name: &str) -> String {
        format!(
            "{}/works/{}",
            self.works_url(consumer),
            utf8_percent_encode(name, PATH_SEGMENT)
        )
    }

    /// Attach headers and clamp the timeout to the cancellation deadline.
    fn prepare<B>(
        &self,
        cancel: &CancelToken,
        request: ureq::RequestBuilder<B>,
    ) -> ureq::RequestBuilder<B> {
        request
            .config()
            .timeout_global(Some(cancel.bound(self.request_timeout)))
            .build()
            .header("User-Agent", self.user_agent.as_str())
            .header(SOURCE_ID_HEADER, self.source_id.as_str())
    }

    /// Turn a raw outcome into a 2xx response or a typed error.
    fn finish(
        &self,
        cancel: &CancelToken,
        target: &Target<'_>,
        result: std::result::Result<Response, ureq::Error>,
    ) -> Result<Response> {
        let mut response = match result {
            Ok(response) => response,
            Err(_) if cancel.is_cancelled() => {
                return Err(Error::Cancelled {
                    operation: target.operation,
                });
            }
            Err(e) => {
                return Err(Error::transport(
                    target.operation,
                    target.consumer,
                    target.name,
                    e.to_string(),
                    None,
                ));
            }
        };

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(response);
        }

        let body = response.body_mut().read_to_string().unwrap_or_default();
        Err(status_error(target, status, body.trim()))
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        target: &Target<'_>,
        response: &mut Response,
    ) -> Result<T> {
        response.body_mut().read_json().map_err(|e| {
            Error::transport(
                target.operation,
                target.consumer,
                target.name,
                format!("invalid response body: {e}"),
                None,
            )
        })
    }
}

/// Map a non-2xx status to the error taxonomy.
fn status_error(target: &Target<'_>, status: u16, body: &str) -> Error {
    let message = if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    };

    match (status, target.name) {
        (404, Some(name)) => Error::not_found(target.consumer, name),
        (409 | 412, name) => Error::Conflict {
            consumer: target.consumer.to_string(),
            name: name.unwrap_or_default().to_string(),
            message,
        },
        _ => Error::transport(
            target.operation,
            target.consumer,
            target.name,
            message,
            Some(status),
        ),
    }
}

impl Transport for HttpTransport {
    fn get(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<WorkRecord> {
        let target = Target {
            operation: Operation::Get,
            consumer,
            name: Some(name),
        };
        cancel.check(target.operation)?;

        let result = self
            .prepare(cancel, self.agent.get(&self.work_url(consumer, name)))
            .call();
        let mut response = self.finish(cancel, &target, result)?;
        self.read_json(&target, &mut response)
    }

    fn list(&self, cancel: &CancelToken, consumer: &str) -> Result<Vec<WorkRecord>> {
        let target = Target {
            operation: Operation::List,
            consumer,
            name: None,
        };
        cancel.check(target.operation)?;

        let result = self
            .prepare(cancel, self.agent.get(&self.works_url(consumer)))
            .call();
        let mut response = self.finish(cancel, &target, result)?;
        let list: ItemList<WorkRecord> = self.read_json(&target, &mut response)?;
        Ok(list.items)
    }

    fn create(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        bundle: &WorkBundle,
    ) -> Result<WorkRecord> {
        let target = Target {
            operation: Operation::Create,
            consumer,
            name: Some(&bundle.name),
        };
        cancel.check(target.operation)?;

        let result = self
            .prepare(cancel, self.agent.post(&self.works_url(consumer)))
            .send_json(bundle);
        let mut response = self.finish(cancel, &target, result)?;
        self.read_json(&target, &mut response)
    }

    fn patch(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        name: &str,
        patch: &Value,
    ) -> Result<WorkRecord> {
        let target = Target {
            operation: Operation::Patch,
            consumer,
            name: Some(name),
        };
        cancel.check(target.operation)?;

        let body = serde_json::to_string(patch)?;
        let result = self
            .prepare(cancel, self.agent.patch(&self.work_url(consumer, name)))
            .header("Content-Type", MERGE_PATCH_CONTENT_TYPE)
            .send(body);
        let mut response = self.finish(cancel, &target, result)?;
        self.read_json(&target, &mut response)
    }

    fn delete(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<()> {
        let target = Target {
            operation: Operation::Delete,
            consumer,
            name: Some(name),
        };
        cancel.check(target.operation)?;

        let result = self
            .prepare(cancel, self.agent.delete(&self.work_url(consumer, name)))
            .call();
        self.finish(cancel, &target, result)?;
        Ok(())
    }
}

impl ConsumerRegistry for HttpTransport {
    fn list_consumers(
        &self,
        cancel: &CancelToken,
        page_size: usize,
    ) -> Result<Vec<ConsumerDescriptor>> {
        let target = Target {
            operation: Operation::ListConsumers,
            consumer: "",
            name: None,
        };
        cancel.check(target.operation)?;

        let result = self
            .prepare(cancel, self.agent.get(&self.consumers_url(page_size)))
            .call();
        let mut response = self.finish(cancel, &target, result)?;
        let list: ItemList<ConsumerDescriptor> = self.read_json(&target, &mut response)?;
        Ok(list.items)
    }
}

// =============================================================================
// Hub API response types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ItemList<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(&HubConfig::new("https://hub.example.com/", "workcast")).unwrap()
    }

    fn target(name: Option<&str>) -> Target<'_> {
        Target {
            operation: Operation::Patch,
            consumer: "cluster-a",
            name,
        }
    }

    #[test]
    fn test_urls() {
        let t = transport();
        assert_eq!(t.base_url(), "https://hub.example.com");
        assert_eq!(t.health_url(), "https://hub.example.com/healthz");
        assert_eq!(
            t.consumers_url(1000),
            "https://hub.example.com/api/v1/consumers?size=1000"
        );
        assert_eq!(
            t.works_url("cluster-a"),
            "https://hub.example.com/api/v1/consumers/cluster-a/works"
        );
        assert_eq!(
            t.work_url("cluster-a", "demo-work"),
            "https://hub.example.com/api/v1/consumers/cluster-a/works/demo-work"
        );
    }

    #[test]
    fn test_urls_escape_path_segments() {
        let t = transport();
        assert_eq!(
            t.works_url("team a/b"),
            "https://hub.example.com/api/v1/consumers/team%20a%2Fb/works"
        );
        assert_eq!(
            t.work_url("team a/b", "x?y#z"),
            "https://hub.example.com/api/v1/consumers/team%20a%2Fb/works/x%3Fy%23z"
        );
        assert_eq!(
            t.work_url("east-1", "app_v1.2~rc-work"),
            "https://hub.example.com/api/v1/consumers/east-1/works/app_v1.2~rc-work"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = HttpTransport::new(&HubConfig::new("hub.example.com", "s"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_with_user_agent() {
        let t = transport().with_user_agent("workcast/9.9.9");
        assert_eq!(t.user_agent, "workcast/9.9.9");
    }

    #[test]
    fn test_status_error_not_found() {
        let err = status_error(&target(Some("demo-work")), 404, "");
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_status_error_not_found_without_name_is_transport() {
        let err = status_error(&target(None), 404, "no such consumer");
        assert!(matches!(err, Error::Transport { status: Some(404), .. }));
        assert!(err.to_string().contains("no such consumer"));
    }

    #[test]
    fn test_status_error_conflict() {
        for status in [409, 412] {
            let err = status_error(&target(Some("demo-work")), status, "stale");
            assert!(matches!(err, Error::Conflict { .. }));
        }
    }

    #[test]
    fn test_status_error_server_failure() {
        let err = status_error(&target(Some("demo-work")), 503, "");
        match err {
            Error::Transport {
                operation, status, ..
            } => {
                assert_eq!(operation, Operation::Patch);
                assert_eq!(status, Some(503));
            }
            other => panic!("Expected Error::Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_request() {
        let t = transport();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(t.get(&cancel, "c", "w").unwrap_err().is_cancelled());
        assert!(t.delete(&cancel, "c", "w").unwrap_err().is_cancelled());
        assert!(t.list_consumers(&cancel, 10).unwrap_err().is_cancelled());
        assert!(
            t.wait_healthy(&cancel, Duration::from_secs(1))
                .unwrap_err()
                .is_cancelled()
        );
    }

    #[test]
    fn test_item_list_decoding() {
        let list: ItemList<ConsumerDescriptor> =
            serde_json::from_str(r#"{"items": [{"id": "1", "name": "east"}, {"id": "2"}]}"#)
                .unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].display_id(), Some("2"));

        let empty: ItemList<WorkRecord> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
