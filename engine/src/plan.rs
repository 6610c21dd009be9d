//! Sync planning.
//!
//! Combines diffing and retention into the static plan a caller applies:
//! which entries to add, update and delete, and the collection that results.

use crate::collection::QueryEntry;
use crate::diff::diff_at;
use crate::retention::{RetentionFilter, RetentionPolicy};
use crate::version::{base_name, encode_at, VersionTag};
use crate::{Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options for one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Publish changed queries as new versions under this tag
    pub version: Option<VersionTag>,
    /// Pruning of old versions after the sync
    pub retention: RetentionPolicy,
    /// Drop every remote entry and publish the fresh collection from scratch
    pub reset: bool,
}

/// The outcome of planning a sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    /// Entries to create
    pub added: Vec<QueryEntry>,
    /// Entries that change a published query. Unversioned updates replace the
    /// remote entry of the same name; versioned ones are new entries.
    pub updated: Vec<QueryEntry>,
    /// Remote entries to remove
    pub deleted: Vec<QueryEntry>,
    /// Number of fresh entries already in sync
    pub unchanged: usize,
    /// Whether `updated` entries are new versions rather than replacements
    pub versioned: bool,
    /// The full collection once the plan is applied
    pub collection: Vec<QueryEntry>,
}

impl SyncPlan {
    /// Check if applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Whether applying the plan overwrites published queries in place.
    pub fn requires_confirmation(&self) -> bool {
        !self.versioned && !self.updated.is_empty()
    }
}

/// Plan the sync of `fresh` onto `remote` as of `now`.
pub fn plan_sync(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    options: &SyncOptions,
    now: Timestamp,
) -> Result<SyncPlan> {
    let mut plan = if options.reset {
        plan_reset(remote, fresh, options.version.as_ref(), now)
    } else {
        plan_merge(remote, fresh, options.version.as_ref(), now)?
    };

    if options.retention.is_enabled() {
        let mut filter = RetentionFilter::new(options.retention);
        filter.add_entries(&plan.collection);
        let expired = filter.queries_to_delete_at(now);
        if !expired.is_empty() {
            let expired_names: HashSet<String> =
                expired.iter().map(|entry| entry.name.clone()).collect();
            // Versions planned in this pass that expire right away are
            // simply never published.
            let pending: HashSet<String> = plan
                .added
                .iter()
                .chain(&plan.updated)
                .map(|entry| entry.name.clone())
                .collect();

            plan.collection
                .retain(|entry| !expired_names.contains(&entry.name));
            plan.added
                .retain(|entry| !expired_names.contains(&entry.name));
            plan.updated
                .retain(|entry| !expired_names.contains(&entry.name));
            plan.deleted.extend(
                expired
                    .into_iter()
                    .filter(|entry| !pending.contains(&entry.name)),
            );
        }
    }

    tracing::debug!(
        added = plan.added.len(),
        updated = plan.updated.len(),
        deleted = plan.deleted.len(),
        unchanged = plan.unchanged,
        "sync planned"
    );
    Ok(plan)
}

fn plan_reset(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    version: Option<&VersionTag>,
    now: Timestamp,
) -> SyncPlan {
    let added: Vec<QueryEntry> = fresh
        .iter()
        .map(|entry| match version {
            Some(tag) => QueryEntry::new(encode_at(base_name(&entry.name), tag, now), &entry.query),
            None => entry.clone(),
        })
        .collect();

    SyncPlan {
        collection: added.clone(),
        added,
        updated: Vec::new(),
        deleted: remote.to_vec(),
        unchanged: 0,
        versioned: version.is_some(),
    }
}

fn plan_merge(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    version: Option<&VersionTag>,
    now: Timestamp,
) -> Result<SyncPlan> {
    let diff = diff_at(remote, fresh, version, now)?;

    let mut collection = remote.to_vec();
    if version.is_none() {
        for replacement in &diff.updated {
            if let Some(slot) = collection
                .iter_mut()
                .find(|entry| entry.name == replacement.name)
            {
                slot.query = replacement.query.clone();
            }
        }
        collection.extend(diff.added.iter().cloned());
    } else {
        collection.extend(diff.added.iter().cloned());
        collection.extend(diff.updated.iter().cloned());
    }

    Ok(SyncPlan {
        added: diff.added,
        updated: diff.updated,
        deleted: Vec::new(),
        unchanged: diff.unchanged.len(),
        versioned: version.is_some(),
        collection,
    })
}
