//! Version retention.
//!
//! Decides which stored versions of each logical query may be deleted. Two
//! independent thresholds apply per base name:
//!
//! - `max_version_days`: versions published strictly before `now - days` are
//!   day candidates.
//! - `max_version_count`: ranked newest first, versions past the first
//!   `count` are count candidates.
//!
//! A threshold `<= 0` disables its policy. With both enabled a version is
//! deleted only when it is a candidate of both. The newest version of every
//! base name is always kept.

use crate::clock::{days_to_millis, Clock, SystemClock};
use crate::collection::QueryEntry;
use crate::version::decode;
use crate::{QueryName, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Retention thresholds. Any value `<= 0` disables that policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    /// Keep versions younger than this many days
    pub max_version_days: i64,
    /// Keep at most this many versions per base name
    pub max_version_count: i64,
}

impl RetentionPolicy {
    pub fn new(max_version_days: i64, max_version_count: i64) -> Self {
        Self {
            max_version_days,
            max_version_count,
        }
    }

    /// Check if either policy is enabled.
    pub fn is_enabled(&self) -> bool {
        self.max_version_days > 0 || self.max_version_count > 0
    }
}

/// A stored version registered with the filter.
#[derive(Debug, Clone)]
struct StoredVersion {
    timestamp: Timestamp,
    entry: QueryEntry,
}

/// Accumulates stored versions, then yields the ones to delete.
///
/// Register every stored version with [`add_query`](Self::add_query) or
/// [`add_entry`](Self::add_entry), then read the delete set once; reading
/// consumes the filter.
#[derive(Debug, Clone)]
pub struct RetentionFilter {
    policy: RetentionPolicy,
    /// Families in first-seen order
    families: Vec<(QueryName, Vec<StoredVersion>)>,
    index: HashMap<QueryName, usize>,
}

impl RetentionFilter {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            families: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a stored version.
    ///
    /// `timestamp` is the decimal publish time in milliseconds. A timestamp
    /// that does not parse excludes the version from retention entirely.
    pub fn add_query(&mut self, timestamp: &str, full_name: &str, base_name: &str, query: &str) {
        let Ok(timestamp) = timestamp.trim().parse::<Timestamp>() else {
            tracing::debug!(name = full_name, timestamp, "malformed timestamp, version kept");
            return;
        };
        self.insert(base_name, timestamp, QueryEntry::new(full_name, query));
    }

    /// Register a stored entry, decoding its name. Unversioned entries are
    /// not subject to retention and are ignored.
    pub fn add_entry(&mut self, entry: &QueryEntry) {
        if let Some(versioned) = decode(&entry.name) {
            self.insert(&versioned.base_name, versioned.timestamp, entry.clone());
        }
    }

    /// Register every entry of a collection.
    pub fn add_entries<'a>(&mut self, entries: impl IntoIterator<Item = &'a QueryEntry>) {
        for entry in entries {
            self.add_entry(entry);
        }
    }

    fn insert(&mut self, base_name: &str, timestamp: Timestamp, entry: QueryEntry) {
        let position = match self.index.get(base_name) {
            Some(&position) => position,
            None => {
                self.families.push((base_name.to_string(), Vec::new()));
                self.index
                    .insert(base_name.to_string(), self.families.len() - 1);
                self.families.len() - 1
            }
        };
        self.families[position]
            .1
            .push(StoredVersion { timestamp, entry });
    }

    /// Number of registered versions.
    pub fn len(&self) -> usize {
        self.families.iter().map(|(_, versions)| versions.len()).sum()
    }

    /// Check if no version is registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Versions to delete as of the system clock.
    pub fn queries_to_delete(self) -> Vec<QueryEntry> {
        let now = SystemClock.now_millis();
        self.queries_to_delete_at(now)
    }

    /// Versions to delete as of `now`.
    ///
    /// Grouped by base name in registration order, newest first within a
    /// group.
    pub fn queries_to_delete_at(self, now: Timestamp) -> Vec<QueryEntry> {
        if !self.policy.is_enabled() {
            return Vec::new();
        }

        let policy = self.policy;
        let mut deleted = Vec::new();
        for (base_name, versions) in self.families {
            let before = deleted.len();
            deleted.extend(select_family(policy, versions, now));
            if deleted.len() > before {
                tracing::debug!(
                    base_name = %base_name,
                    count = deleted.len() - before,
                    "versions selected for deletion"
                );
            }
        }
        deleted
    }
}

/// Delete set of one family.
fn select_family(
    policy: RetentionPolicy,
    mut versions: Vec<StoredVersion>,
    now: Timestamp,
) -> impl Iterator<Item = QueryEntry> {
    // Stable: equal timestamps keep registration order
    versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let by_days = policy.max_version_days > 0;
    let by_count = policy.max_version_count > 0;
    let threshold = now.saturating_sub(days_to_millis(policy.max_version_days));
    let keep = usize::try_from(policy.max_version_count).unwrap_or(usize::MAX);

    versions
        .into_iter()
        .enumerate()
        // The newest version always survives
        .skip(1)
        .filter(move |(rank, version)| {
            let day_candidate = version.timestamp < threshold;
            let count_candidate = *rank >= keep;
            match (by_days, by_count) {
                (true, true) => day_candidate && count_candidate,
                (true, false) => day_candidate,
                (false, true) => count_candidate,
                (false, false) => false,
            }
        })
        .map(|(_, version)| version.entry)
}
