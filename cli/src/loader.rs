//! Source document loading.

use crate::error::{AppError, Result};
use allowlist_engine::SourceDocument;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as GraphQL documents when walking directories.
const EXTENSIONS: &[&str] = &["graphql", "gql"];

/// Load and parse every document under `paths`.
///
/// A file path is loaded as is. A directory is walked recursively for
/// `.graphql` and `.gql` files in file-name order.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();
    for path in paths {
        for file in expand(path)? {
            let text = fs::read_to_string(&file).map_err(|source| AppError::Read {
                path: file.clone(),
                source,
            })?;
            let document = SourceDocument::parse(file.display().to_string(), &text)?;
            tracing::debug!(
                path = %file.display(),
                definitions = document.definitions.len(),
                "document loaded"
            );
            documents.push(document);
        }
    }
    Ok(documents)
}

fn expand(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|source| AppError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_graphql(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_graphql(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| EXTENSIONS.contains(&extension))
}
