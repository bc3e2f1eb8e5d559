//! JSON merge patches (RFC 7386) between an existing and a desired work.
//!
//! Only the bundle's mutable spec fields are compared, so remote-owned data
//! (status, bookkeeping) never appears in a patch. Arrays are replaced
//! wholesale, which keeps manifest ordinals intact.

use crate::error::Result;
use crate::types::{WorkBundle, WorkRecord};
use serde_json::{Map, Value};

/// Bundle fields a reconcile may change.
pub const PATCHED_FIELDS: &[&str] = &["manifests", "manifestConfigs"];

/// Precondition key carried by every non-empty work patch.
pub const RESOURCE_VERSION_KEY: &str = "resourceVersion";

/// Merge patch turning `existing` into `desired`, or `None` if they already match.
///
/// The patch carries the observed `resourceVersion` so the hub can reject it
/// if the work changed in between.
pub fn work_patch(existing: &WorkRecord, desired: &WorkBundle) -> Result<Option<Value>> {
    let current = project(&serde_json::to_value(&existing.bundle)?);
    let wanted = project(&serde_json::to_value(desired)?);

    let patch = diff(&current, &wanted);
    if is_empty(&patch) {
        return Ok(None);
    }

    let mut patch = match patch {
        Value::Object(map) => map,
        other => return Ok(Some(other)),
    };
    if !existing.resource_version.is_empty() {
        patch.insert(
            RESOURCE_VERSION_KEY.to_string(),
            Value::String(existing.resource_version.clone()),
        );
    }
    Ok(Some(Value::Object(patch)))
}

/// Compute the merge patch that turns `current` into `desired`.
pub fn diff(current: &Value, desired: &Value) -> Value {
    match (current, desired) {
        (Value::Object(current), Value::Object(desired)) => {
            let mut patch = Map::new();

            for key in current.keys() {
                if !desired.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }

            for (key, wanted) in desired {
                match current.get(key) {
                    Some(have) if have == wanted => {}
                    Some(have) => {
                        patch.insert(key.clone(), diff(have, wanted));
                    }
                    None => {
                        patch.insert(key.clone(), wanted.clone());
                    }
                }
            }

            Value::Object(patch)
        }
        _ => desired.clone(),
    }
}

/// Apply a merge patch to `target` in place.
pub fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                merge(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Whether a patch changes nothing.
pub fn is_empty(patch: &Value) -> bool {
    matches!(patch, Value::Object(map) if map.is_empty())
}

fn project(bundle: &Value) -> Value {
    let fields = PATCHED_FIELDS
        .iter()
        .filter_map(|field| {
            bundle
                .get(*field)
                .map(|value| ((*field).to_string(), value.clone()))
        })
        .collect();
    Value::Object(fields)
}
