//! Kind to plural resource name mapping.
//!
//! The table is data: add an entry here to address a new kind, do not add
//! branches. Entries are kept exactly as the hub expects them, including the
//! irregular `...es` forms (`configmapes`, `namespacees`) that are not proper
//! English plurals.

/// Lower-cased kinds with a fixed plural.
pub const PLURALS: &[(&str, &str)] = &[
    // Irregular: take an "es" suffix
    ("namespace", "namespacees"),
    ("ingress", "ingresses"),
    ("configmap", "configmapes"),
    ("endpoints", "endpointses"),
    // Common: take an "s" suffix
    ("service", "services"),
    ("deployment", "deployments"),
    ("daemonset", "daemonsets"),
    ("statefulset", "statefulsets"),
    ("replicaset", "replicasets"),
    ("secret", "secrets"),
    ("pod", "pods"),
];

/// Map a kind to the plural resource name used for remote addressing.
///
/// Kinds not in [`PLURALS`] get `es` when they already end in `s`, else `s`.
pub fn kind_to_resource(kind: &str) -> String {
    let kind = kind.to_lowercase();

    if let Some((_, plural)) = PLURALS.iter().find(|(k, _)| *k == kind) {
        return (*plural).to_string();
    }

    if kind.ends_with('s') {
        format!("{kind}es")
    } else {
        format!("{kind}s")
    }
}
