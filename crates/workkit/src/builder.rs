//! Work bundle construction.

use crate::addresser::kind_to_resource;
use crate::error::{Error, Result};
use crate::types::{
    AddressedResource, DeleteOption, FeedbackRule, ManifestConfig, PropagationPolicy,
    ResourceIdentifier, UpdateStrategy, WORK_SUFFIX, WorkBundle,
};

/// Build a work bundle from addressed resources.
///
/// The bundle is named `name`, or `<first resource name>-work` when no name
/// is given. Manifest *i* is resource *i* unmodified and gets config *i*:
/// its remote identifier, a single `status` feedback rule and an
/// apply-merge update strategy. Deletes propagate in the foreground.
pub fn build(resources: &[AddressedResource], name: Option<&str>) -> Result<WorkBundle> {
    let first = resources.first().ok_or(Error::EmptyInput)?;

    let name = match name {
        Some(name) if name.trim().is_empty() => {
            return Err(Error::Config("work name must not be blank".to_string()));
        }
        Some(name) => name.to_string(),
        None if first.name().is_empty() => {
            return Err(Error::Config(
                "work name is required when the first resource has no metadata.name".to_string(),
            ));
        }
        None => format!("{}{WORK_SUFFIX}", first.name()),
    };

    let manifest_configs = resources.iter().map(manifest_config).collect();

    Ok(WorkBundle {
        name,
        manifests: resources.to_vec(),
        manifest_configs,
        delete_option: DeleteOption {
            propagation_policy: PropagationPolicy::Foreground,
        },
    })
}

/// Config for one manifest.
pub fn manifest_config(resource: &AddressedResource) -> ManifestConfig {
    ManifestConfig {
        resource_identifier: resource_identifier(resource),
        feedback_rules: vec![FeedbackRule::status()],
        update_strategy: UpdateStrategy::ApplyMerge,
    }
}

/// Remote addressing key for a resource.
pub fn resource_identifier(resource: &AddressedResource) -> ResourceIdentifier {
    ResourceIdentifier {
        group: resource.group().to_string(),
        resource: kind_to_resource(resource.kind()),
        namespace: resource.namespace().to_string(),
        name: resource.name().to_string(),
    }
}

/// Work name for a resource or cluster name: appends `-work` unless present.
pub fn work_name_for(name: &str) -> String {
    if name.ends_with(WORK_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{WORK_SUFFIX}")
    }
}

/// Display name for a work: strips one trailing `-work`.
pub fn display_name_for(work_name: &str) -> &str {
    work_name.strip_suffix(WORK_SUFFIX).unwrap_or(work_name)
}
