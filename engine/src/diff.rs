//! Collection diffing.
//!
//! Compares a freshly built collection against the remote one and classifies
//! every fresh entry as added, updated or unchanged.
//!
//! # Modes
//!
//! - **Unversioned**: entries are matched by exact name and compared by exact
//!   text. An updated entry replaces the remote one in place.
//! - **Versioned**: entries are matched by base name. A changed entry is
//!   published under a new version-encoded name next to the old versions,
//!   never over them. Re-publishing an existing tag with different content is
//!   a [`Error::VersionConflict`].

use crate::clock::{Clock, SystemClock};
use crate::collection::{to_map, QueryEntry};
use crate::document::equivalent;
use crate::version::{base_name, decode, encode_at, VersionTag};
use crate::{Error, QueryName, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a fresh collection against the remote one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Entries with no remote counterpart
    pub added: Vec<QueryEntry>,
    /// Entries whose remote counterpart has different content
    pub updated: Vec<QueryEntry>,
    /// Names of fresh entries already in sync
    pub unchanged: Vec<QueryName>,
}

impl DiffResult {
    /// Check if nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Remote versions sharing one base name.
#[derive(Debug, Default)]
struct Family<'a> {
    /// Most recent version; unversioned entries rank below any timestamp
    latest: Option<(Option<Timestamp>, &'a QueryEntry)>,
    /// Newest published version of each tag
    tagged: HashMap<String, (Timestamp, &'a QueryEntry)>,
}

impl<'a> Family<'a> {
    fn observe(&mut self, timestamp: Option<Timestamp>, entry: &'a QueryEntry) {
        let newer = match self.latest {
            Some((current, _)) => timestamp > current,
            None => true,
        };
        if newer {
            self.latest = Some((timestamp, entry));
        }
    }

    fn observe_tag(&mut self, tag: String, timestamp: Timestamp, entry: &'a QueryEntry) {
        let slot = self.tagged.entry(tag).or_insert((timestamp, entry));
        if timestamp > slot.0 {
            *slot = (timestamp, entry);
        }
    }
}

/// Diff `fresh` against `remote`, stamping new versions with the system clock.
pub fn diff(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    version: Option<&VersionTag>,
) -> Result<DiffResult> {
    diff_at(remote, fresh, version, SystemClock.now_millis())
}

/// Diff `fresh` against `remote`, stamping new versions with `now`.
pub fn diff_at(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    version: Option<&VersionTag>,
    now: Timestamp,
) -> Result<DiffResult> {
    match version {
        None => Ok(diff_unversioned(remote, fresh)),
        Some(tag) => diff_versioned(remote, fresh, tag, now),
    }
}

fn diff_unversioned(remote: &[QueryEntry], fresh: &[QueryEntry]) -> DiffResult {
    let remote = to_map(remote);
    let mut result = DiffResult::default();

    for entry in fresh {
        match remote.get(entry.name.as_str()) {
            None => result.added.push(entry.clone()),
            Some(query) if *query != entry.query => result.updated.push(entry.clone()),
            Some(_) => result.unchanged.push(entry.name.clone()),
        }
    }

    result
}

fn diff_versioned(
    remote: &[QueryEntry],
    fresh: &[QueryEntry],
    tag: &VersionTag,
    now: Timestamp,
) -> Result<DiffResult> {
    let mut families: HashMap<&str, Family<'_>> = HashMap::new();
    for entry in remote {
        let family = families.entry(base_name(&entry.name)).or_default();
        match decode(&entry.name) {
            Some(versioned) => {
                family.observe(Some(versioned.timestamp), entry);
                family.observe_tag(versioned.tag, versioned.timestamp, entry);
            }
            None => family.observe(None, entry),
        }
    }

    let mut result = DiffResult::default();
    for entry in fresh {
        let base = base_name(&entry.name);
        let family = families.get(base);

        if let Some(&(_, published)) = family.and_then(|family| family.tagged.get(tag.as_str())) {
            if !equivalent(&published.query, &entry.query) {
                return Err(Error::VersionConflict {
                    name: base.to_string(),
                    tag: tag.to_string(),
                });
            }
            result.unchanged.push(published.name.clone());
            continue;
        }

        let latest = family.and_then(|family| family.latest.map(|(_, latest)| latest));
        match latest {
            Some(latest) if equivalent(&latest.query, &entry.query) => {
                result.unchanged.push(latest.name.clone());
            }
            Some(_) => result
                .updated
                .push(QueryEntry::new(encode_at(base, tag, now), entry.query.clone())),
            None => result
                .added
                .push(QueryEntry::new(encode_at(base, tag, now), entry.query.clone())),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_706_745_600_000;

    fn entry(name: &str, query: &str) -> QueryEntry {
        QueryEntry::new(name, query)
    }

    fn tag(value: &str) -> VersionTag {
        VersionTag::new(value).unwrap()
    }

    #[test]
    fn unversioned_added_and_updated() {
        let remote = vec![entry("A", "x")];
        let fresh = vec![entry("A", "y"), entry("B", "z")];

        let result = diff(&remote, &fresh, None).unwrap();
        assert_eq!(result.added, vec![entry("B", "z")]);
        assert_eq!(result.updated, vec![entry("A", "y")]);
        assert!(result.unchanged.is_empty());
    }

    #[test]
    fn unversioned_identical_is_unchanged() {
        let remote = vec![entry("A", "x")];
        let fresh = vec![entry("A", "x")];

        let result = diff(&remote, &fresh, None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.unchanged, vec!["A".to_string()]);
    }

    #[test]
    fn unversioned_compares_exact_text() {
        let remote = vec![entry("A", "query A { a }")];
        let fresh = vec![entry("A", "query A {\n  a\n}")];

        let result = diff(&remote, &fresh, None).unwrap();
        assert_eq!(result.updated.len(), 1);
    }

    #[test]
    fn empty_remote_adds_everything() {
        let fresh = vec![entry("A", "x"), entry("B", "y")];
        let result = diff(&[], &fresh, None).unwrap();
        assert_eq!(result.added, fresh);
    }

    #[test]
    fn versioned_new_name_is_added_with_encoded_name() {
        let fresh = vec![entry("GetUser", "query GetUser { id }")];
        let result = diff_at(&[], &fresh, Some(&tag("v1")), NOW).unwrap();

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].name, "GetUser___(1706745600000-v1)");
        assert_eq!(result.added[0].query, "query GetUser { id }");
    }

    #[test]
    fn versioned_change_appends_new_version() {
        let remote = vec![entry("GetUser___(1000-v1)", "query GetUser { id }")];
        let fresh = vec![entry("GetUser", "query GetUser { id name }")];

        let result = diff_at(&remote, &fresh, Some(&tag("v2")), NOW).unwrap();
        assert!(result.added.is_empty());
        assert_eq!(result.updated.len(), 1);
        assert_eq!(result.updated[0].name, "GetUser___(1706745600000-v2)");
    }

    #[test]
    fn versioned_compares_against_latest_version() {
        let remote = vec![
            entry("GetUser___(3000-v3)", "query GetUser { id name }"),
            entry("GetUser___(1000-v1)", "query GetUser { id }"),
        ];
        let fresh = vec![entry("GetUser", "query GetUser {\n  id\n  name\n}")];

        let result = diff_at(&remote, &fresh, Some(&tag("v4")), NOW).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.unchanged, vec!["GetUser___(3000-v3)".to_string()]);
    }

    #[test]
    fn versioned_formatting_only_change_is_not_an_update() {
        let remote = vec![entry("GetUser___(1000-v1)", "query GetUser { id }")];
        let fresh = vec![entry("GetUser", "query GetUser {\n  id\n}")];

        let result = diff_at(&remote, &fresh, Some(&tag("v1")), NOW).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn versioned_same_tag_different_content_conflicts() {
        let remote = vec![entry("GetUser___(1000-v1)", "query GetUser { id }")];
        let fresh = vec![entry("GetUser", "query GetUser { id name }")];

        let err = diff_at(&remote, &fresh, Some(&tag("v1")), NOW).unwrap_err();
        assert_eq!(
            err,
            Error::VersionConflict {
                name: "GetUser".into(),
                tag: "v1".into()
            }
        );
    }

    #[test]
    fn versioned_conflict_aborts_whole_diff() {
        let remote = vec![entry("B___(1000-v1)", "query B { b }")];
        let fresh = vec![entry("A", "query A { a }"), entry("B", "query B { c }")];
        assert!(diff_at(&remote, &fresh, Some(&tag("v1")), NOW).is_err());
    }

    #[test]
    fn versioned_treats_unversioned_remote_as_prior_version() {
        let remote = vec![entry("GetUser", "query GetUser { id }")];

        let same = vec![entry("GetUser", "query GetUser { id }")];
        assert!(diff_at(&remote, &same, Some(&tag("v1")), NOW)
            .unwrap()
            .is_empty());

        let changed = vec![entry("GetUser", "query GetUser { name }")];
        let result = diff_at(&remote, &changed, Some(&tag("v1")), NOW).unwrap();
        assert_eq!(result.updated.len(), 1);
        assert!(result.added.is_empty());
    }

    #[test]
    fn versioned_other_base_names_do_not_interfere() {
        let remote = vec![entry("GetPost___(1000-v1)", "query GetPost { id }")];
        let fresh = vec![entry("GetUser", "query GetUser { id }")];

        let result = diff_at(&remote, &fresh, Some(&tag("v1")), NOW).unwrap();
        assert_eq!(result.added.len(), 1);
    }

    #[test]
    fn versioned_tag_check_uses_newest_entry_of_that_tag() {
        let older = entry("GetUser___(1000-v1)", "query GetUser { a }");
        let newer = entry("GetUser___(2000-v1)", "query GetUser { b }");
        let fresh = vec![entry("GetUser", "query GetUser { b }")];

        for remote in [vec![older.clone(), newer.clone()], vec![newer.clone(), older.clone()]] {
            let result = diff_at(&remote, &fresh, Some(&tag("v1")), NOW).unwrap();
            assert!(result.is_empty());
            assert_eq!(result.unchanged, vec!["GetUser___(2000-v1)".to_string()]);
        }
    }
}
