//! Transport and consumer registry contracts.
//!
//! The [`Transport`] trait is the only way the reconciler and lister reach
//! remote consumers; how works actually travel (connection, authentication,
//! wire encoding) is up to the implementation. [`http::HttpTransport`] talks
//! to a hub over HTTP.
//!
//! # Testing
//!
//! Use [`MemoryTransport`] and [`MemoryRegistry`] to run against in-process
//! state:
//!
//! ```
//! use workkit::transport::{MemoryTransport, Transport};
//! use workkit::{CancelToken, build, decode};
//!
//! let transport = MemoryTransport::new();
//! let resources = decode("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
//! let bundle = build(&resources, None).unwrap();
//!
//! transport.create(&CancelToken::new(), "cluster-a", &bundle).unwrap();
//! let record = transport.get(&CancelToken::new(), "cluster-a", "s-work").unwrap();
//! assert_eq!(record.bundle, bundle);
//! ```

pub mod http;

use crate::cancel::CancelToken;
use crate::error::{Error, Operation, Result};
use crate::patch::{self, RESOURCE_VERSION_KEY};
use crate::types::{ConsumerDescriptor, WorkBundle, WorkRecord, WorkStatus};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Channel that moves works to and from consumers.
///
/// Implementations must be safe to share across threads; every call checks
/// `cancel` before doing any work.
///
/// A blocking call already in flight is only cut short by the token's
/// deadline, which bounds each request timeout. [`CancelToken::cancel`] takes
/// effect at the next call.
pub trait Transport: Send + Sync {
    /// Fetch a work with its reported status.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the consumer has no such work.
    fn get(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<WorkRecord>;

    /// List every work held for a consumer.
    fn list(&self, cancel: &CancelToken, consumer: &str) -> Result<Vec<WorkRecord>>;

    /// Create a work.
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` if a work with that name already exists.
    fn create(&self, cancel: &CancelToken, consumer: &str, bundle: &WorkBundle)
    -> Result<WorkRecord>;

    /// Apply a JSON merge patch to a work.
    ///
    /// A `resourceVersion` key in the patch is a precondition, not a field:
    /// the patch must be rejected with `Error::Conflict` if it no longer
    /// matches the stored work.
    fn patch(&self, cancel: &CancelToken, consumer: &str, name: &str, patch: &Value)
    -> Result<WorkRecord>;

    /// Delete a work, waiting for its remote objects to be removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the consumer has no such work.
    fn delete(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<()>;
}

/// Source of registered consumers.
pub trait ConsumerRegistry: Send + Sync {
    /// List up to `page_size` consumers.
    fn list_consumers(
        &self,
        cancel: &CancelToken,
        page_size: usize,
    ) -> Result<Vec<ConsumerDescriptor>>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub consumer: String,
    pub name: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    works: BTreeMap<String, BTreeMap<String, WorkRecord>>,
    next_version: u64,
    calls: Vec<Call>,
    failures: HashMap<(Operation, String), String>,
}

/// Transport backed by in-process state.
///
/// Clones share state, so a test can keep one handle for inspection while
/// another is boxed into a [`crate::Client`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a work directly, bypassing the call log.
    pub fn insert(&self, consumer: &str, mut record: WorkRecord) {
        let mut state = self.lock();
        state.next_version += 1;
        record.resource_version = state.next_version.to_string();
        state
            .works
            .entry(consumer.to_string())
            .or_default()
            .insert(record.bundle.name.clone(), record);
    }

    /// Replace the status of a stored work, as the remote agent would.
    ///
    /// Returns `false` if the work does not exist.
    pub fn set_status(&self, consumer: &str, name: &str, status: WorkStatus) -> bool {
        let mut state = self.lock();
        match state.works.get_mut(consumer).and_then(|w| w.get_mut(name)) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Make every `operation` call for `consumer` fail with a transport error.
    pub fn fail(&self, operation: Operation, consumer: &str, message: impl Into<String>) {
        self.lock()
            .failures
            .insert((operation, consumer.to_string()), message.into());
    }

    /// Works currently stored for a consumer.
    pub fn works(&self, consumer: &str) -> Vec<WorkRecord> {
        self.lock()
            .works
            .get(consumer)
            .map(|w| w.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of create, patch and delete calls made so far.
    pub fn writes(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c.operation,
                    Operation::Create | Operation::Patch | Operation::Delete
                )
            })
            .count()
    }

    /// Check cancellation, record the call and apply injected failures.
    fn begin(
        &self,
        cancel: &CancelToken,
        operation: Operation,
        consumer: &str,
        name: Option<&str>,
    ) -> Result<MutexGuard<'_, MemoryState>> {
        cancel.check(operation)?;
        let mut state = self.lock();
        state.calls.push(Call {
            operation,
            consumer: consumer.to_string(),
            name: name.map(str::to_string),
        });
        if let Some(message) = state.failures.get(&(operation, consumer.to_string())) {
            return Err(Error::transport(
                operation,
                consumer,
                name,
                message.clone(),
                None,
            ));
        }
        Ok(state)
    }
}

impl Transport for MemoryTransport {
    fn get(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<WorkRecord> {
        let state = self.begin(cancel, Operation::Get, consumer, Some(name))?;
        state
            .works
            .get(consumer)
            .and_then(|w| w.get(name))
            .cloned()
            .ok_or_else(|| Error::not_found(consumer, name))
    }

    fn list(&self, cancel: &CancelToken, consumer: &str) -> Result<Vec<WorkRecord>> {
        let state = self.begin(cancel, Operation::List, consumer, None)?;
        Ok(state
            .works
            .get(consumer)
            .map(|w| w.values().cloned().collect())
            .unwrap_or_default())
    }

    fn create(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        bundle: &WorkBundle,
    ) -> Result<WorkRecord> {
        let mut state = self.begin(cancel, Operation::Create, consumer, Some(&bundle.name))?;
        if state
            .works
            .get(consumer)
            .is_some_and(|w| w.contains_key(&bundle.name))
        {
            return Err(Error::Conflict {
                consumer: consumer.to_string(),
                name: bundle.name.clone(),
                message: "work already exists".to_string(),
            });
        }

        state.next_version += 1;
        let record = WorkRecord {
            bundle: bundle.clone(),
            resource_version: state.next_version.to_string(),
            creation_timestamp: Some(Utc::now()),
            status: WorkStatus::default(),
        };
        state
            .works
            .entry(consumer.to_string())
            .or_default()
            .insert(bundle.name.clone(), record.clone());
        Ok(record)
    }

    fn patch(
        &self,
        cancel: &CancelToken,
        consumer: &str,
        name: &str,
        patch: &Value,
    ) -> Result<WorkRecord> {
        let mut state = self.begin(cancel, Operation::Patch, consumer, Some(name))?;
        let next_version = state.next_version + 1;

        let record = state
            .works
            .get_mut(consumer)
            .and_then(|w| w.get_mut(name))
            .ok_or_else(|| Error::not_found(consumer, name))?;

        let mut changes = patch.clone();
        if let Some(expected) = changes
            .as_object_mut()
            .and_then(|p| p.remove(RESOURCE_VERSION_KEY))
            && expected.as_str() != Some(record.resource_version.as_str())
        {
            return Err(Error::Conflict {
                consumer: consumer.to_string(),
                name: name.to_string(),
                message: format!(
                    "resourceVersion {expected} does not match current {}",
                    record.resource_version
                ),
            });
        }

        let mut bundle = serde_json::to_value(&record.bundle)?;
        patch::merge(&mut bundle, &changes);
        let mut bundle: WorkBundle = serde_json::from_value(bundle)?;
        bundle.name = name.to_string();

        record.bundle = bundle;
        record.resource_version = next_version.to_string();
        let updated = record.clone();
        state.next_version = next_version;
        Ok(updated)
    }

    fn delete(&self, cancel: &CancelToken, consumer: &str, name: &str) -> Result<()> {
        let mut state = self.begin(cancel, Operation::Delete, consumer, Some(name))?;
        state
            .works
            .get_mut(consumer)
            .and_then(|w| w.remove(name))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(consumer, name))
    }
}

/// Consumer registry backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    consumers: Vec<ConsumerDescriptor>,
    failure: Option<String>,
}

impl MemoryRegistry {
    pub fn new(consumers: Vec<ConsumerDescriptor>) -> Self {
        Self {
            consumers,
            failure: None,
        }
    }

    /// A registry whose every listing fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            consumers: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

impl ConsumerRegistry for MemoryRegistry {
    fn list_consumers(
        &self,
        cancel: &CancelToken,
        page_size: usize,
    ) -> Result<Vec<ConsumerDescriptor>> {
        cancel.check(Operation::ListConsumers)?;
        if let Some(message) = &self.failure {
            return Err(Error::transport(
                Operation::ListConsumers,
                "",
                None,
                message.clone(),
                None,
            ));
        }
        Ok(self.consumers.iter().take(page_size).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::decode::decode;
    use serde_json::json;

    fn secret_bundle() -> WorkBundle {
        let resources = decode("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
        build(&resources, None).unwrap()
    }

    #[test]
    fn test_memory_transport_new() {
        let transport = MemoryTransport::new();
        let works = transport.list(&CancelToken::new(), "c").unwrap();
        assert!(works.is_empty());
    }

    #[test]
    fn test_create_then_get() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        let created = transport.create(&cancel, "c", &secret_bundle()).unwrap();
        assert!(created.creation_timestamp.is_some());
        assert!(!created.resource_version.is_empty());

        let fetched = transport.get(&cancel, "c", "s-work").unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_get_missing() {
        let transport = MemoryTransport::new();
        let err = transport.get(&CancelToken::new(), "c", "nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_create_duplicate_conflicts() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        transport.create(&cancel, "c", &secret_bundle()).unwrap();
        let err = transport.create(&cancel, "c", &secret_bundle()).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_patch_stale_version_conflicts() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        transport.create(&cancel, "c", &secret_bundle()).unwrap();

        let err = transport
            .patch(
                &cancel,
                "c",
                "s-work",
                &json!({"resourceVersion": "999", "manifests": []}),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_patch_bumps_version() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        let created = transport.create(&cancel, "c", &secret_bundle()).unwrap();

        let patched = transport
            .patch(
                &cancel,
                "c",
                "s-work",
                &json!({"resourceVersion": created.resource_version, "manifests": [], "manifestConfigs": []}),
            )
            .unwrap();
        assert!(patched.bundle.manifests.is_empty());
        assert_ne!(patched.resource_version, created.resource_version);
        assert_eq!(patched.creation_timestamp, created.creation_timestamp);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let transport = MemoryTransport::new();
        let err = transport.delete(&CancelToken::new(), "c", "nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_injected_failure() {
        let transport = MemoryTransport::new();
        transport.fail(Operation::List, "bad", "connection reset");
        let err = transport.list(&CancelToken::new(), "bad").unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                operation: Operation::List,
                ..
            }
        ));
        assert!(transport.list(&CancelToken::new(), "good").is_ok());
    }

    #[test]
    fn test_cancelled_call_is_not_recorded() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = transport.get(&cancel, "c", "x").unwrap_err();
        assert!(err.is_cancelled());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_set_status() {
        let transport = MemoryTransport::new();
        transport.create(&CancelToken::new(), "c", &secret_bundle()).unwrap();
        assert!(transport.set_status("c", "s-work", WorkStatus::default()));
        assert!(!transport.set_status("c", "missing", WorkStatus::default()));
    }

    #[test]
    fn test_writes_counts_mutations_only() {
        let transport = MemoryTransport::new();
        let cancel = CancelToken::new();
        transport.create(&cancel, "c", &secret_bundle()).unwrap();
        transport.get(&cancel, "c", "s-work").unwrap();
        transport.list(&cancel, "c").unwrap();
        transport.delete(&cancel, "c", "s-work").unwrap();
        assert_eq!(transport.writes(), 2);
        assert_eq!(transport.calls().len(), 4);
    }

    #[test]
    fn test_memory_registry_page_size() {
        let registry = MemoryRegistry::new(vec![
            ConsumerDescriptor::new("1", "a"),
            ConsumerDescriptor::new("2", "b"),
            ConsumerDescriptor::new("3", "c"),
        ]);
        let consumers = registry.list_consumers(&CancelToken::new(), 2).unwrap();
        assert_eq!(consumers.len(), 2);
    }

    #[test]
    fn test_memory_registry_failing() {
        let registry = MemoryRegistry::failing("registry down");
        assert!(registry.list_consumers(&CancelToken::new(), 10).is_err());
    }
}
