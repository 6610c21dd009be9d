//! Fragment resolution.
//!
//! Fragments are pooled across every input document into one [`FragmentMap`].
//! Each operation's allow-list text is its own canonical text followed by the
//! text of every fragment it reaches, depth first in document order.

use crate::document::{fragment_spreads, print_fragment, SourceDocument};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How often a fragment reachable through several spreads is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentInclusion {
    /// Once per spread that reaches it (default)
    #[default]
    PerReference,
    /// At most once per operation
    Once,
}

/// A fragment ready to be appended to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFragment {
    /// Canonical fragment text
    pub text: String,
    /// Fragments spread by this one, in document order
    pub spreads: Vec<String>,
}

/// Fragment name to definition, pooled across documents.
#[derive(Debug, Clone, Default)]
pub struct FragmentMap {
    fragments: HashMap<String, ResolvedFragment>,
}

impl FragmentMap {
    /// Collect every fragment definition of `documents`.
    ///
    /// Fragment names are global: a later definition with the same name
    /// replaces an earlier one.
    pub fn resolve<'a>(documents: impl IntoIterator<Item = &'a SourceDocument>) -> Self {
        let mut fragments = HashMap::new();
        for document in documents {
            for fragment in document.fragments() {
                let resolved = ResolvedFragment {
                    text: print_fragment(fragment),
                    spreads: fragment_spreads(fragment),
                };
                if fragments.insert(fragment.name.clone(), resolved).is_some() {
                    tracing::debug!(
                        fragment = %fragment.name,
                        location = %document.location,
                        "fragment redefined, keeping the later definition"
                    );
                }
            }
        }
        Self { fragments }
    }

    /// Get a fragment by name.
    pub fn get(&self, name: &str) -> Option<&ResolvedFragment> {
        self.fragments.get(name)
    }

    /// Number of distinct fragment names.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if no fragment was found.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Append the fragments reachable from `spreads` to `operation_text`.
    ///
    /// Each appended fragment is separated by a blank line. A spread that
    /// names an unknown fragment, or that would re-enter a fragment already
    /// on the current path, is skipped.
    pub fn inline(
        &self,
        operation_text: &str,
        spreads: &[String],
        inclusion: FragmentInclusion,
    ) -> String {
        let mut query = operation_text.to_string();
        let mut stack: Vec<(usize, &str)> =
            spreads.iter().rev().map(|name| (0, name.as_str())).collect();
        // Ancestors of the fragment being visited, root first
        let mut path: Vec<&str> = Vec::new();
        let mut emitted: HashSet<&str> = HashSet::new();

        while let Some((depth, name)) = stack.pop() {
            path.truncate(depth);
            if path.contains(&name) {
                tracing::warn!(fragment = name, "cyclic fragment spread skipped");
                continue;
            }
            let Some(fragment) = self.fragments.get(name) else {
                tracing::warn!(fragment = name, "spread of unknown fragment skipped");
                continue;
            };
            if inclusion == FragmentInclusion::Once && !emitted.insert(name) {
                continue;
            }

            query.push_str("\n\n");
            query.push_str(&fragment.text);
            path.push(name);
            stack.extend(
                fragment
                    .spreads
                    .iter()
                    .rev()
                    .map(|child| (depth + 1, child.as_str())),
            );
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(location: &str, text: &str) -> SourceDocument {
        SourceDocument::parse(location, text).unwrap()
    }

    fn spreads(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn pools_fragments_across_documents() {
        let docs = [
            doc("a", "fragment A on T { a }"),
            doc("b", "fragment B on T { b } query Q { ...A }"),
        ];
        let map = FragmentMap::resolve(&docs);
        assert_eq!(map.len(), 2);
        assert!(map.get("A").is_some());
        assert!(map.get("B").is_some());
        assert!(map.get("C").is_none());
    }

    #[test]
    fn later_definition_wins() {
        let docs = [
            doc("a", "fragment A on T { first }"),
            doc("b", "fragment A on T { second }"),
        ];
        let map = FragmentMap::resolve(&docs);
        assert_eq!(map.len(), 1);
        assert!(map.get("A").unwrap().text.contains("second"));
    }

    #[test]
    fn inlines_depth_first() {
        let docs = [doc(
            "a",
            "fragment A on T { a ...C } fragment B on T { b } fragment C on T { c }",
        )];
        let map = FragmentMap::resolve(&docs);
        let query = map.inline("query Q", &spreads(&["A", "B"]), FragmentInclusion::PerReference);

        let a = query.find("fragment A").unwrap();
        let b = query.find("fragment B").unwrap();
        let c = query.find("fragment C").unwrap();
        assert!(query.starts_with("query Q\n\nfragment A"));
        assert!(a < c && c < b);
    }

    #[test]
    fn per_reference_repeats_shared_fragments() {
        let docs = [doc(
            "a",
            "fragment A on T { ...Shared } fragment B on T { ...Shared } fragment Shared on T { s }",
        )];
        let map = FragmentMap::resolve(&docs);

        let repeated = map.inline("query Q", &spreads(&["A", "B"]), FragmentInclusion::PerReference);
        assert_eq!(repeated.matches("fragment Shared").count(), 2);

        let once = map.inline("query Q", &spreads(&["A", "B"]), FragmentInclusion::Once);
        assert_eq!(once.matches("fragment Shared").count(), 1);
    }

    #[test]
    fn unknown_fragment_is_skipped() {
        let map = FragmentMap::default();
        let query = map.inline("query Q", &spreads(&["Missing"]), FragmentInclusion::PerReference);
        assert_eq!(query, "query Q");
    }

    #[test]
    fn cycle_is_cut() {
        let docs = [doc(
            "a",
            "fragment A on T { a ...B } fragment B on T { b ...A }",
        )];
        let map = FragmentMap::resolve(&docs);
        let query = map.inline("query Q", &spreads(&["A"]), FragmentInclusion::PerReference);
        assert_eq!(query.matches("fragment A").count(), 1);
        assert_eq!(query.matches("fragment B").count(), 1);
    }
}
