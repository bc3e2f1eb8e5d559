//! Listing works for one consumer or across every registered consumer.

use crate::builder::display_name_for;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::reconcile::require_consumer;
use crate::transport::{ConsumerRegistry, Transport};
use crate::types::{WorkInfo, WorkRecord};

/// Which consumers a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// A single named consumer.
    Consumer(String),
    /// Every consumer known to the registry.
    All,
}

/// List works for `scope`.
pub fn list(
    registry: &dyn ConsumerRegistry,
    transport: &dyn Transport,
    cancel: &CancelToken,
    scope: &ListScope,
    page_size: usize,
) -> Result<Vec<WorkInfo>> {
    match scope {
        ListScope::Consumer(consumer) => list_consumer(transport, cancel, consumer),
        ListScope::All => list_all(registry, transport, cancel, page_size),
    }
}

/// List every work held for one consumer.
pub fn list_consumer(
    transport: &dyn Transport,
    cancel: &CancelToken,
    consumer: &str,
) -> Result<Vec<WorkInfo>> {
    require_consumer(consumer)?;
    let records = transport.list(cancel, consumer)?;
    Ok(records.iter().map(|r| work_info(consumer, r)).collect())
}

/// List works across every registered consumer.
///
/// A consumer whose listing fails contributes nothing and the rest carry on;
/// a registry failure or cancellation aborts the whole call.
pub fn list_all(
    registry: &dyn ConsumerRegistry,
    transport: &dyn Transport,
    cancel: &CancelToken,
    page_size: usize,
) -> Result<Vec<WorkInfo>> {
    let consumers = registry.list_consumers(cancel, page_size)?;
    log::debug!("Registry returned {} consumers", consumers.len());

    let mut works = Vec::new();
    for consumer in &consumers {
        let Some(id) = consumer.display_id() else {
            continue;
        };

        match list_consumer(transport, cancel, id) {
            Ok(mut found) => works.append(&mut found),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => log::warn!("Skipping consumer {id}: {e}"),
        }
    }

    Ok(works)
}

/// Whether a listing spans more than one consumer.
pub fn has_multiple_consumers(works: &[WorkInfo]) -> bool {
    works
        .first()
        .is_some_and(|first| works.iter().any(|w| w.consumer != first.consumer))
}

fn work_info(consumer: &str, record: &WorkRecord) -> WorkInfo {
    WorkInfo {
        work_name: record.name().to_string(),
        display_name: display_name_for(record.name()).to_string(),
        consumer: consumer.to_string(),
        created_at: record.creation_timestamp,
    }
}
