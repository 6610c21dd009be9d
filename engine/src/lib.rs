//! # Allow-list Engine
//!
//! A deterministic engine that keeps a query allow-list in sync with a set of
//! GraphQL source documents.
//!
//! This crate holds the core logic only: building the collection of named
//! queries, diffing it against what the service already has, naming versions,
//! and deciding which old versions to prune. It produces plans; applying them
//! is up to the caller.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never touches files or the network
//! - **Deterministic**: same inputs (and same `now`) give same outputs
//! - **Atomic**: a build or diff either returns its full result or an error
//!
//! ## Core Concepts
//!
//! ### Collection
//!
//! [`CollectionBuilder`] turns [`SourceDocument`]s into [`QueryEntry`]s: one
//! per named operation, with every fragment it reaches appended to its text.
//! Two operations may share a name only if they are identical.
//!
//! ### Diff
//!
//! [`diff`] classifies fresh entries as added, updated or unchanged against
//! the remote collection. With a [`VersionTag`], changes are published as new
//! version-encoded names instead of replacing existing ones.
//!
//! ### Versions
//!
//! Versioned names follow `<baseName>___(<epoch-millis>-<versionTag>)`; see
//! [`encode`] and [`decode`].
//!
//! ### Retention
//!
//! [`RetentionFilter`] selects the versions to delete under a day window, a
//! version count, or both.
//!
//! ## Quick Start
//!
//! ```rust
//! use allowlist_engine::{build_collection, plan_sync, QueryEntry, SourceDocument, SyncOptions};
//!
//! let documents = vec![SourceDocument::parse(
//!     "users.graphql",
//!     "query GetUser { user { ...UserParts } } fragment UserParts on User { id name }",
//! )
//! .unwrap()];
//!
//! let fresh = build_collection(&documents).unwrap();
//! assert_eq!(fresh.len(), 1);
//! assert!(fresh[0].query.contains("fragment UserParts"));
//!
//! let remote = vec![QueryEntry::new("GetUser", "query GetUser { user { id } }")];
//! let plan = plan_sync(&remote, &fresh, &SyncOptions::default(), 1706745600000).unwrap();
//! assert_eq!(plan.updated.len(), 1);
//! ```

pub mod clock;
pub mod collection;
pub mod diff;
pub mod document;
pub mod error;
pub mod fragment;
pub mod introspection;
pub mod metadata;
pub mod plan;
pub mod retention;
pub mod version;

// Re-export main types at crate root
pub use clock::{Clock, FixedClock, SystemClock, MILLIS_PER_DAY};
pub use collection::{build_collection, CollectionBuilder, QueryEntry};
pub use diff::{diff, diff_at, DiffResult};
pub use document::{SourceDefinition, SourceDocument};
pub use error::{Error, Result};
pub use fragment::{FragmentInclusion, FragmentMap};
pub use introspection::introspection_entry;
pub use metadata::{Metadata, QueryCollection, DEFAULT_COLLECTION};
pub use plan::{plan_sync, SyncOptions, SyncPlan};
pub use retention::{RetentionFilter, RetentionPolicy};
pub use version::{decode, encode, encode_at, VersionTag, VersionedName};

/// Type aliases for clarity
pub type QueryName = String;
pub type Timestamp = i64;
