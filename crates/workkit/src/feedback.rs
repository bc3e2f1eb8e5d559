//! Correlation of reported status feedback with a work's manifests.

use crate::error::{Error, Result};
use crate::types::{
    AddressedResource, GroupVersionKind, STATUS_FEEDBACK_NAME, WorkRecord, WorkStatus,
};
use serde_json::Value;

/// Kind of manifest to pull out of a work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl TargetKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Target from an `apiVersion` string such as `apps/v1`.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        let gvk = GroupVersionKind::from_api_version(api_version, kind);
        Self::new(gvk.group, gvk.version, gvk.kind)
    }

    pub fn api_version(&self) -> String {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
        }
        .api_version()
    }
}

/// Find the first manifest of `target` kind in `record` and return it with
/// its reported status under `status`.
///
/// Manifests match on kind and group first, then on kind and full
/// `apiVersion`. Missing feedback is not an error: the manifest comes back
/// as written.
///
/// # Errors
///
/// Returns `Error::ResourceIdentifierMismatch` if no manifest matches.
pub fn extract_status(record: &WorkRecord, target: &TargetKind) -> Result<AddressedResource> {
    let manifests = &record.bundle.manifests;
    let api_version = target.api_version();

    let found = manifests
        .iter()
        .position(|m| m.kind() == target.kind && m.group() == target.group)
        .or_else(|| {
            manifests
                .iter()
                .position(|m| m.kind() == target.kind && m.api_version() == api_version)
        });

    let Some(ordinal) = found else {
        return Err(Error::ResourceIdentifierMismatch {
            work: record.name().to_string(),
            message: format!("no {} manifest with apiVersion {api_version}", target.kind),
        });
    };

    Ok(with_feedback(record, ordinal))
}

/// Every manifest of `record`, each merged with its reported status.
pub fn resources_with_status(record: &WorkRecord) -> Vec<AddressedResource> {
    (0..record.bundle.manifests.len())
        .map(|ordinal| with_feedback(record, ordinal))
        .collect()
}

fn with_feedback(record: &WorkRecord, ordinal: usize) -> AddressedResource {
    let manifest = record.bundle.manifests[ordinal].clone();
    match feedback_for_ordinal(&record.status, ordinal, manifest.gvk()) {
        Some(status) => manifest.with_status(status),
        None => manifest,
    }
}

/// Parsed `status` feedback reported for the manifest at `ordinal`.
///
/// An entry carrying the exact ordinal wins. Entries without an ordinal are
/// matched on kind and group, first one wins.
pub fn feedback_for_ordinal(
    status: &WorkStatus,
    ordinal: usize,
    gvk: &GroupVersionKind,
) -> Option<Value> {
    let entry = status
        .manifests
        .iter()
        .find(|s| s.resource_meta.ordinal == Some(ordinal))
        .or_else(|| {
            status.manifests.iter().find(|s| {
                s.resource_meta.ordinal.is_none()
                    && s.resource_meta.kind == gvk.kind
                    && s.resource_meta.group == gvk.group
            })
        })?;

    let raw = entry.feedback_raw(STATUS_FEEDBACK_NAME)?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(
                "Ignoring unparsable status feedback for {} {}: {e}",
                gvk.kind,
                entry.resource_meta.name
            );
            None
        }
    }
}
