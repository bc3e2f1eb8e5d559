//! # workkit
//!
//! Pure Rust library for distributing declarative resource bundles ("works")
//! from a hub to remote consumers and reading back what they report.
//!
//! This crate provides functionality for:
//! - Decoding multi-document YAML/JSON manifests
//! - Addressing each resource (group, plural resource name, namespace, name)
//! - Building a work bundle with per-manifest feedback and update settings
//! - Create-or-patch reconciliation with JSON merge patches
//! - Correlating reported status feedback with manifests
//! - Listing works for one consumer or across the whole registry
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use workkit::transport::MemoryTransport;
//! use workkit::{ApplyResult, CancelToken, Client};
//!
//! let client = Client::with_transport(Arc::new(MemoryTransport::new()));
//! let cancel = CancelToken::new();
//!
//! let manifests = "apiVersion: example.io/v1\nkind: Widget\nmetadata:\n  name: w1\n";
//! let result = client.apply_manifests(&cancel, "cluster-a", manifests, None).unwrap();
//! assert_eq!(result, ApplyResult::Created);
//!
//! let record = client.get(&cancel, "cluster-a", "w1-work").unwrap();
//! assert_eq!(record.bundle.manifests.len(), 1);
//! ```
//!
//! ## Talking to a hub
//!
//! ```no_run
//! use workkit::{CancelToken, Client, HubConfig, ListScope};
//!
//! let config = HubConfig::new("https://hub.example.com", "workcast");
//! let cancel = CancelToken::new();
//! let client = Client::connect(&config, &cancel).expect("hub not reachable");
//!
//! for work in client.list(&cancel, &ListScope::All).unwrap() {
//!     println!("{} on {}", work.display_name, work.consumer);
//! }
//! ```

#![warn(clippy::all)]

pub mod addresser;
pub mod builder;
pub mod cancel;
pub mod config;
pub mod decode;
pub mod error;
pub mod feedback;
pub mod lister;
pub mod patch;
pub mod reconcile;
pub mod transport;
pub mod types;

pub use builder::build;
pub use cancel::CancelToken;
pub use config::HubConfig;
pub use decode::{decode, decode_file, encode};
pub use error::{Error, ErrorCategory, Operation, Result};
pub use feedback::TargetKind;
pub use lister::ListScope;
pub use reconcile::Plan;
pub use types::{
    AddressedResource, ApplyResult, ConsumerDescriptor, GroupVersionKind, WorkBundle, WorkInfo,
    WorkRecord, WorkStatus,
};

use std::sync::Arc;
use transport::http::HttpTransport;
use transport::{ConsumerRegistry, Transport};

/// High-level client for work operations against one hub.
///
/// Holds a transport and, for listings across consumers, a consumer
/// registry. One client can serve any number of operations.
pub struct Client {
    transport: Arc<dyn Transport>,
    registry: Option<Arc<dyn ConsumerRegistry>>,
    page_size: usize,
}

impl Client {
    /// Connect to a hub over HTTP, waiting for it to report healthy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config and `Error::Transport`
    /// if the health wait times out.
    pub fn connect(config: &HubConfig, cancel: &CancelToken) -> Result<Self> {
        let http = HttpTransport::connect(config, cancel)?;
        Ok(Self::from_http(http).with_page_size(config.page_size))
    }

    /// Use an already connected HTTP transport as both transport and registry.
    #[must_use]
    pub fn from_http(http: HttpTransport) -> Self {
        let http = Arc::new(http);
        Self {
            transport: Arc::clone(&http) as Arc<dyn Transport>,
            registry: Some(http as Arc<dyn ConsumerRegistry>),
            page_size: config::DEFAULT_PAGE_SIZE,
        }
    }

    /// Create a client with a custom transport and no registry.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: None,
            page_size: config::DEFAULT_PAGE_SIZE,
        }
    }

    /// Attach a consumer registry for [`ListScope::All`] listings.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn ConsumerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the registry page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // =========================================================================
    // Reconcile
    // =========================================================================

    /// Decode manifests, build a work and apply it in one step.
    ///
    /// Nothing is sent unless decoding and building both succeed.
    pub fn apply_manifests(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        manifests: &str,
        work_name: Option<&str>,
    ) -> Result<ApplyResult> {
        let resources = decode(manifests)?;
        let bundle = build(&resources, work_name)?;
        self.apply(cancel, consumer, &bundle)
    }

    /// Create or patch a work.
    pub fn apply(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        bundle: &WorkBundle,
    ) -> Result<ApplyResult> {
        reconcile::apply(self.transport.as_ref(), cancel, consumer, bundle)
    }

    /// What [`Client::apply`] would do, without writing.
    pub fn plan(&self, cancel: &CancelToken, consumer: &str, bundle: &WorkBundle) -> Result<Plan> {
        reconcile::plan(self.transport.as_ref(), cancel, consumer, bundle)
    }

    /// Fetch a work with its reported status.
    pub fn get(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<WorkRecord> {
        reconcile::get(self.transport.as_ref(), cancel, consumer, name)
    }

    /// Fetch a work and return its first `target` manifest with status merged in.
    pub fn get_status(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        name: &str,
        target: &TargetKind,
    ) -> Result<AddressedResource> {
        let record = self.get(cancel, consumer, name)?;
        feedback::extract_status(&record, target)
    }

    /// Delete a work. Deleting an absent work succeeds.
    pub fn delete(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<()> {
        reconcile::delete(self.transport.as_ref(), cancel, consumer, name)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List works for one consumer or every registered consumer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for [`ListScope::All`] when the client has no
    /// registry.
    pub fn list(&self, cancel: &CancelToken, scope: &ListScope) -> Result<Vec<WorkInfo>> {
        match (scope, &self.registry) {
            (ListScope::Consumer(consumer), _) => {
                lister::list_consumer(self.transport.as_ref(), cancel, consumer)
            }
            (ListScope::All, Some(registry)) => lister::list_all(
                registry.as_ref(),
                self.transport.as_ref(),
                cancel,
                self.page_size,
            ),
            (ListScope::All, None) => Err(Error::Config(
                "listing every consumer requires a consumer registry".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use transport::{MemoryRegistry, MemoryTransport};
    use types::{FeedbackValue, ManifestStatus, ResourceMeta};

    const WIDGET: &str = "apiVersion: example.io/v1\nkind: Widget\nmetadata:\n  name: w1\nspec:\n  size: 1\n";

    fn client() -> (Client, MemoryTransport) {
        let transport = MemoryTransport::new();
        let registry = MemoryRegistry::new(vec![
            ConsumerDescriptor::new("1", "east"),
            ConsumerDescriptor::new("2", "west"),
        ]);
        let client = Client::with_transport(Arc::new(transport.clone()))
            .with_registry(Arc::new(registry));
        (client, transport)
    }

    #[test]
    fn test_apply_manifests_lifecycle() {
        let (client, transport) = client();
        let cancel = CancelToken::new();

        assert_eq!(
            client.apply_manifests(&cancel, "east", WIDGET, None).unwrap(),
            ApplyResult::Created
        );
        assert_eq!(
            client.apply_manifests(&cancel, "east", WIDGET, None).unwrap(),
            ApplyResult::NoChange
        );
        assert_eq!(
            client
                .apply_manifests(&cancel, "east", &WIDGET.replace("size: 1", "size: 2"), None)
                .unwrap(),
            ApplyResult::Modified
        );

        client.delete(&cancel, "east", "w1-work").unwrap();
        assert!(transport.works("east").is_empty());
    }

    #[test]
    fn test_apply_manifests_bad_input_sends_nothing() {
        let (client, transport) = client();
        let err = client
            .apply_manifests(&CancelToken::new(), "east", "kind: Widget\n", None)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResource { .. }));

        let err = client
            .apply_manifests(&CancelToken::new(), "east", "", None)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_get_status() {
        let (client, transport) = client();
        let cancel = CancelToken::new();
        client.apply_manifests(&cancel, "east", WIDGET, None).unwrap();

        transport.set_status(
            "east",
            "w1-work",
            WorkStatus {
                manifests: vec![ManifestStatus {
                    resource_meta: ResourceMeta {
                        ordinal: Some(0),
                        group: "example.io".to_string(),
                        kind: "Widget".to_string(),
                        ..Default::default()
                    },
                    feedback: vec![FeedbackValue {
                        name: "status".to_string(),
                        json_raw: Some(r#"{"phase":"Ready"}"#.to_string()),
                    }],
                }],
            },
        );

        let target = TargetKind::from_api_version("example.io/v1", "Widget");
        let widget = client.get_status(&cancel, "east", "w1-work", &target).unwrap();
        assert_eq!(widget.status(), Some(&json!({"phase": "Ready"})));
    }

    #[test]
    fn test_list_all_and_single() {
        let (client, _) = client();
        let cancel = CancelToken::new();
        client.apply_manifests(&cancel, "east", WIDGET, None).unwrap();
        client
            .apply_manifests(&cancel, "west", WIDGET, Some("other-work"))
            .unwrap();

        let all = client.list(&cancel, &ListScope::All).unwrap();
        assert_eq!(all.len(), 2);

        let west = client
            .list(&cancel, &ListScope::Consumer("west".to_string()))
            .unwrap();
        assert_eq!(west.len(), 1);
        assert_eq!(west[0].display_name, "other");
    }

    #[test]
    fn test_list_all_without_registry() {
        let client = Client::with_transport(Arc::new(MemoryTransport::new()));
        let err = client
            .list(&CancelToken::new(), &ListScope::All)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_page_size() {
        let client = Client::with_transport(Arc::new(MemoryTransport::new()));
        assert_eq!(client.page_size(), 1000);
        assert_eq!(client.with_page_size(5).page_size(), 5);
    }

    #[test]
    fn test_connect_rejects_invalid_config() {
        let config = HubConfig::new("", "workcast");
        let err = Client::connect(&config, &CancelToken::new()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
