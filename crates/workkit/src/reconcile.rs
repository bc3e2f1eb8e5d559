//! Create-or-patch reconciliation of works against a transport.
//!
//! Applying is a get followed by either a create (when the work is absent) or
//! a merge patch (when it differs). Re-applying an unchanged bundle sends
//! nothing. Races between the get and the write surface as
//! [`Error::Conflict`]; there is no automatic retry.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::patch::work_patch;
use crate::transport::Transport;
use crate::types::{ApplyResult, WorkBundle, WorkRecord};
use serde_json::Value;

/// What an apply would do, without doing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// The work does not exist yet.
    Create,
    /// The work exists and differs; carries the merge patch to send.
    Patch(Value),
    /// The work already matches.
    NoChange,
}

impl Plan {
    /// The result applying this plan would report.
    pub fn result(&self) -> ApplyResult {
        match self {
            Self::Create => ApplyResult::Created,
            Self::Patch(_) => ApplyResult::Modified,
            Self::NoChange => ApplyResult::NoChange,
        }
    }
}

pub(crate) fn require_consumer(consumer: &str) -> Result<()> {
    if consumer.trim().is_empty() {
        return Err(Error::Config("consumer name is required".to_string()));
    }
    Ok(())
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config("work name is required".to_string()));
    }
    Ok(())
}

/// Work out what applying `bundle` to `consumer` would do.
pub fn plan(
    transport: &dyn Transport,
    cancel: &CancelToken,
    consumer: &str,
    bundle: &WorkBundle,
) -> Result<Plan> {
    require_consumer(consumer)?;
    require_name(&bundle.name)?;
    bundle.validate()?;

    let existing = match transport.get(cancel, consumer, &bundle.name) {
        Ok(existing) => existing,
        Err(Error::NotFound { .. }) => return Ok(Plan::Create),
        Err(e) => return Err(e),
    };

    Ok(match work_patch(&existing, bundle)? {
        Some(patch) => Plan::Patch(patch),
        None => Plan::NoChange,
    })
}

/// Create `bundle` on `consumer`, or patch the existing work to match it.
///
/// # Errors
///
/// Returns `Error::Config` for a blank consumer or work name before any
/// transport call, `Error::Conflict` if the work changed concurrently, and
/// propagates every other transport failure unchanged.
pub fn apply(
    transport: &dyn Transport,
    cancel: &CancelToken,
    consumer: &str,
    bundle: &WorkBundle,
) -> Result<ApplyResult> {
    let result = match plan(transport, cancel, consumer, bundle)? {
        Plan::Create => {
            log::debug!("Work {} not found on {consumer}, creating", bundle.name);
            transport.create(cancel, consumer, bundle)?;
            ApplyResult::Created
        }
        Plan::Patch(patch) => {
            log::debug!("Patching work {} on {consumer}", bundle.name);
            transport.patch(cancel, consumer, &bundle.name, &patch)?;
            ApplyResult::Modified
        }
        Plan::NoChange => ApplyResult::NoChange,
    };

    log::info!("Applied work {} to {consumer}: {result:?}", bundle.name);
    Ok(result)
}

/// Fetch a work with its reported status.
pub fn get(
    transport: &dyn Transport,
    cancel: &CancelToken,
    consumer: &str,
    name: &str,
) -> Result<WorkRecord> {
    require_consumer(consumer)?;
    require_name(name)?;
    transport.get(cancel, consumer, name)
}

/// Delete a work. Deleting an absent work succeeds.
pub fn delete(
    transport: &dyn Transport,
    cancel: &CancelToken,
    consumer: &str,
    name: &str,
) -> Result<()> {
    require_consumer(consumer)?;
    require_name(name)?;

    match transport.delete(cancel, consumer, name) {
        Ok(()) => {
            log::info!("Deleted work {name} from {consumer}");
            Ok(())
        }
        Err(Error::NotFound { .. }) => {
            log::debug!("Work {name} already absent from {consumer}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
