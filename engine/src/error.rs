//! Error types for the allow-list engine.

use crate::QueryName;
use thiserror::Error;

/// All possible errors from the allow-list engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Pipeline conflicts
    #[error("operation {name} already exists with different content, rename one of them")]
    DuplicateOperation { name: QueryName },

    #[error("version '{tag}' of {name} is already published with different content")]
    VersionConflict { name: QueryName, tag: String },

    // Input errors
    #[error("invalid version tag '{tag}': {reason}")]
    InvalidVersionTag { tag: String, reason: &'static str },

    #[error("failed to parse {location}: {message}")]
    Parse { location: String, message: String },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
