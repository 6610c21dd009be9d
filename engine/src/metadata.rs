//! Remote metadata snapshot.
//!
//! The allow-list lives in the service metadata as a named query collection
//! that is referenced from the allow-list section. This module models just
//! enough of the exported metadata to read and rewrite that collection;
//! every other key is carried through untouched.
//!
//! The `query_collections` shape doubles as the local collection file format.

use crate::collection::QueryEntry;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "allowed-queries";

/// Exported service metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_collections: Vec<QueryCollection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowlist: Vec<AllowListEntry>,
    /// Every other metadata section, preserved verbatim
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A named list of queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCollection {
    pub name: String,
    pub definition: CollectionDefinition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    #[serde(default)]
    pub queries: Vec<QueryEntry>,
}

/// A collection enabled in the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListEntry {
    pub collection: String,
}

impl QueryCollection {
    pub fn new(name: impl Into<String>, queries: Vec<QueryEntry>) -> Self {
        Self {
            name: name.into(),
            definition: CollectionDefinition { queries },
        }
    }
}

impl Metadata {
    /// Parse an exported metadata document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidMetadata(e.to_string()))
    }

    /// Parse an already decoded metadata value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidMetadata(e.to_string()))
    }

    /// Get a query collection by name.
    pub fn collection(&self, name: &str) -> Option<&QueryCollection> {
        self.query_collections
            .iter()
            .find(|collection| collection.name == name)
    }

    /// Queries of a collection, empty when the collection does not exist.
    pub fn queries(&self, name: &str) -> &[QueryEntry] {
        self.collection(name)
            .map(|collection| collection.definition.queries.as_slice())
            .unwrap_or_default()
    }

    /// Check if a collection is enabled in the allow-list.
    pub fn is_allow_listed(&self, name: &str) -> bool {
        self.allowlist.iter().any(|entry| entry.collection == name)
    }
}

/// Parse a local collection file.
pub fn read_collections(json: &str) -> Result<Vec<QueryCollection>> {
    serde_json::from_str(json).map_err(|e| Error::InvalidMetadata(e.to_string()))
}

/// Serialize collections for a local collection file.
pub fn collections_to_json(collections: &[QueryCollection]) -> Result<String> {
    serde_json::to_string_pretty(collections).map_err(|e| Error::InvalidMetadata(e.to_string()))
}

/// Replace the queries of collection `name`, adding the collection if absent.
pub fn upsert_collection(collections: &mut Vec<QueryCollection>, name: &str, queries: Vec<QueryEntry>) {
    match collections.iter_mut().find(|collection| collection.name == name) {
        Some(collection) => collection.definition.queries = queries,
        None => collections.push(QueryCollection::new(name, queries)),
    }
}
