//! Unified error handling for the sync command.

use std::path::PathBuf;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] allowlist_engine::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hasura rejected {request} ({status}): {body}")]
    Hasura {
        request: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Confirmation prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Sync aborted, changed queries were not replaced")]
    Aborted,
}

/// Result type alias for the sync command.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_engine_errors() {
        let err: AppError = allowlist_engine::Error::DuplicateOperation {
            name: "GetUser".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Engine error: operation GetUser already exists with different content, rename one of them"
        );
    }

    #[test]
    fn hasura_error_display() {
        let err = AppError::Hasura {
            request: "add_query_to_collection",
            status: 400,
            body: r#"{"code":"already-exists"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"Hasura rejected add_query_to_collection (400): {"code":"already-exists"}"#
        );
    }
}
