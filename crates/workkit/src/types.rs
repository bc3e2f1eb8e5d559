//! Core types for work bundles, their status and listings.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feedback value name requested for every manifest.
pub const STATUS_FEEDBACK_NAME: &str = "status";

/// Path of the remote sub-document reported back under [`STATUS_FEEDBACK_NAME`].
pub const STATUS_FEEDBACK_PATH: &str = ".status";

/// Suffix appended to a resource name to form its default work name.
pub const WORK_SUFFIX: &str = "-work";

// ============================================================================
// Resources
// ============================================================================

/// Group, version and kind of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    /// Derive the triple from an `apiVersion` string and a kind.
    ///
    /// The first `/` separates group from version; without one the group is
    /// empty and the whole string is the version.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Render the `apiVersion` string (`group/version`, or `version` for the core group).
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// A declarative document plus its derived group/version/kind.
///
/// Serializes as the bare document. Deserializing re-derives the triple and
/// rejects documents missing `apiVersion` or `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct AddressedResource {
    document: Map<String, Value>,
    gvk: GroupVersionKind,
}

impl AddressedResource {
    /// Address a document found at position `index` of some input.
    ///
    /// Returns `Ok(None)` when the document has neither `apiVersion` nor `kind`.
    pub fn from_document(index: usize, document: Value) -> Result<Option<Self>> {
        let Value::Object(document) = document else {
            return Err(Error::malformed(index, "document is not a mapping"));
        };

        let api_version = string_field(index, &document, "apiVersion")?;
        let kind = string_field(index, &document, "kind")?;

        match (api_version, kind) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => Err(Error::malformed(
                index,
                "resource must have both apiVersion and kind",
            )),
            (Some(api_version), Some(kind)) => {
                let gvk = GroupVersionKind::from_api_version(api_version, kind);
                Ok(Some(Self { document, gvk }))
            }
        }
    }

    /// Group/version/kind of this resource.
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    /// The full `apiVersion` string as written in the document.
    pub fn api_version(&self) -> &str {
        self.document
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn group(&self) -> &str {
        &self.gvk.group
    }

    pub fn version(&self) -> &str {
        &self.gvk.version
    }

    /// `metadata.name`, or empty.
    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    /// `metadata.namespace`, or empty for cluster-scoped resources.
    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    /// The document as decoded.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// The `status` sub-document, if any.
    pub fn status(&self) -> Option<&Value> {
        self.document.get("status")
    }

    /// Replace the `status` key with a reported fragment.
    pub fn with_status(mut self, status: Value) -> Self {
        self.document.insert("status".to_string(), status);
        self
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.document
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

fn string_field<'a>(index: usize, document: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Error::malformed(index, format!("{key} must be a string"))),
    }
}

impl TryFrom<Value> for AddressedResource {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_document(0, value)?
            .ok_or_else(|| Error::malformed(0, "manifest has no apiVersion or kind"))
    }
}

impl From<AddressedResource> for Value {
    fn from(resource: AddressedResource) -> Self {
        Value::Object(resource.document)
    }
}

// ============================================================================
// Work bundle
// ============================================================================

/// Remote addressing key for one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(default)]
    pub group: String,
    /// Plural resource name (see [`crate::addresser`]).
    pub resource: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

/// A status sub-path the remote side must report back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRule {
    pub name: String,
    pub path: String,
}

impl FeedbackRule {
    /// The rule requesting the whole `.status` sub-document.
    pub fn status() -> Self {
        Self {
            name: STATUS_FEEDBACK_NAME.to_string(),
            path: STATUS_FEEDBACK_PATH.to_string(),
        }
    }
}

/// How the remote side writes a manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStrategy {
    /// Field-level upsert; fields owned by others are left alone.
    #[default]
    #[serde(rename = "apply-merge")]
    ApplyMerge,
    /// Full replace of the remote object.
    #[serde(rename = "update")]
    Update,
}

/// Per-manifest addressing, feedback and update settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
    pub resource_identifier: ResourceIdentifier,
    #[serde(default)]
    pub feedback_rules: Vec<FeedbackRule>,
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
}

/// Whether dependents are removed before a delete completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagationPolicy {
    #[default]
    Foreground,
    Orphan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOption {
    pub propagation_policy: PropagationPolicy,
}

/// A named set of manifests applied together to one consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkBundle {
    pub name: String,
    #[serde(default)]
    pub manifests: Vec<AddressedResource>,
    #[serde(default)]
    pub manifest_configs: Vec<ManifestConfig>,
    #[serde(default)]
    pub delete_option: DeleteOption,
}

impl WorkBundle {
    /// Check that every manifest has a matching config at the same ordinal.
    pub fn validate(&self) -> Result<()> {
        if self.manifests.len() != self.manifest_configs.len() {
            return Err(Error::ResourceIdentifierMismatch {
                work: self.name.clone(),
                message: format!(
                    "{} manifests but {} manifest configs",
                    self.manifests.len(),
                    self.manifest_configs.len()
                ),
            });
        }

        for (ordinal, (manifest, config)) in self
            .manifests
            .iter()
            .zip(&self.manifest_configs)
            .enumerate()
        {
            let id = &config.resource_identifier;
            if id.name != manifest.name()
                || id.namespace != manifest.namespace()
                || id.group != manifest.group()
            {
                return Err(Error::ResourceIdentifierMismatch {
                    work: self.name.clone(),
                    message: format!(
                        "manifest config at ordinal {ordinal} addresses {}/{}/{} but manifest is {} {}/{}",
                        id.group,
                        id.namespace,
                        id.name,
                        manifest.kind(),
                        manifest.namespace(),
                        manifest.name()
                    ),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Identity of a manifest inside a status report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Position of the manifest in the work, when the remote side reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<usize>,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

/// One named feedback value, carried as a raw serialized fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_raw: Option<String>,
}

/// Status reported for one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStatus {
    pub resource_meta: ResourceMeta,
    #[serde(default)]
    pub feedback: Vec<FeedbackValue>,
}

impl ManifestStatus {
    /// Raw fragment of the named feedback value, if reported.
    pub fn feedback_raw(&self, name: &str) -> Option<&str> {
        self.feedback
            .iter()
            .find(|v| v.name == name)
            .and_then(|v| v.json_raw.as_deref())
    }
}

/// Status of a work as reported by the remote side. Read-only for the hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStatus {
    #[serde(default)]
    pub manifests: Vec<ManifestStatus>,
}

/// A work as stored by the hub: the bundle, bookkeeping and remote status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    #[serde(flatten)]
    pub bundle: WorkBundle,
    /// Opaque version, changes on every write.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: WorkStatus,
}

impl WorkRecord {
    pub fn name(&self) -> &str {
        &self.bundle.name
    }
}

// ============================================================================
// Consumers and listings
// ============================================================================

/// A registered remote target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ConsumerDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Identifier used to address the consumer: its name, else its id.
    pub fn display_id(&self) -> Option<&str> {
        [self.name.as_str(), self.id.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
    }
}

/// Listing projection of a work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkInfo {
    pub work_name: String,
    /// Work name with the `-work` suffix stripped.
    pub display_name: String,
    pub consumer: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkInfo {
    /// Creation time as `YYYY-MM-DD HH:MM:SS`, or empty when unknown.
    pub fn created_display(&self) -> String {
        self.created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Result of applying a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Work did not exist and was created
    Created,
    /// Work existed and was patched
    Modified,
    /// Work already matched; nothing was sent
    NoChange,
}

impl ApplyResult {
    /// Check if the result represents a write
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}
