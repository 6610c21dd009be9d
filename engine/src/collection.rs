//! Query collection building.
//!
//! Turns parsed documents into the list of named entries an allow-list holds.
//! Operation names are unique within a collection: the same name may appear
//! twice only when both definitions print to the same text.

use crate::document::{operation_name, operation_spreads, print_operation, SourceDocument};
use crate::fragment::{FragmentInclusion, FragmentMap};
use crate::{Error, QueryName, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryEntry {
    /// Operation name, possibly carrying a version suffix
    pub name: QueryName,
    /// Operation text with its fragments appended
    pub query: String,
}

impl QueryEntry {
    pub fn new(name: impl Into<QueryName>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }
}

/// Builds a deduplicated, fragment-resolved collection from documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionBuilder {
    inclusion: FragmentInclusion,
}

impl CollectionBuilder {
    /// Create a builder with the default fragment inclusion policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how fragments reachable through several spreads are appended.
    pub fn with_inclusion(mut self, inclusion: FragmentInclusion) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Build the collection.
    ///
    /// Entries follow operation order across documents. Fails with
    /// [`Error::DuplicateOperation`] when two operations share a name but not
    /// their text; an identical duplicate is dropped.
    pub fn build(&self, documents: &[SourceDocument]) -> Result<Vec<QueryEntry>> {
        let fragments = FragmentMap::resolve(documents);

        let mut entries: Vec<QueryEntry> = Vec::new();
        // Operation name -> its own canonical text, without fragments
        let mut seen: HashMap<String, String> = HashMap::new();

        for document in documents {
            for operation in document.operations() {
                let Some(name) = operation_name(operation) else {
                    tracing::warn!(
                        location = %document.location,
                        "anonymous operation skipped, allow-list entries need a name"
                    );
                    continue;
                };
                let text = print_operation(operation);

                if let Some(existing) = seen.get(name) {
                    if *existing != text {
                        return Err(Error::DuplicateOperation {
                            name: name.to_string(),
                        });
                    }
                    tracing::debug!(operation = name, "identical duplicate operation dropped");
                    continue;
                }

                let query = fragments.inline(&text, &operation_spreads(operation), self.inclusion);
                seen.insert(name.to_string(), text);
                entries.push(QueryEntry::new(name, query));
            }
        }

        Ok(entries)
    }
}

/// Build a collection with the default builder.
pub fn build_collection(documents: &[SourceDocument]) -> Result<Vec<QueryEntry>> {
    CollectionBuilder::new().build(documents)
}

/// Name to query text lookup.
pub fn to_map(entries: &[QueryEntry]) -> HashMap<&str, &str> {
    entries
        .iter()
        .map(|entry| (entry.name.as_str(), entry.query.as_str()))
        .collect()
}
