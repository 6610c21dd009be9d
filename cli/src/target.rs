//! Where the allow-list collection lives.
//!
//! A [`Target`] loads the current state of the collection and applies a
//! [`SyncPlan`] to it, either through the Hasura metadata API or by rewriting
//! a local collection file.

use crate::config::TargetConfig;
use crate::error::{AppError, Result};
use crate::hasura::HasuraClient;
use allowlist_engine::metadata::{collections_to_json, read_collections, upsert_collection};
use allowlist_engine::{QueryCollection, QueryEntry, SyncPlan};
use futures::future::try_join_all;
use std::io::ErrorKind;
use std::path::PathBuf;

/// The collection as it currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Queries of the configured collection
    pub queries: Vec<QueryEntry>,
    pub collection_exists: bool,
    /// Whether the collection is enabled in the allow-list. Always true for
    /// files, which have no allow-list.
    pub allow_listed: bool,
    /// Every collection of a collection file, rewritten as a whole
    collections: Vec<QueryCollection>,
}

/// A collection store.
#[derive(Debug, Clone)]
pub enum Target {
    Remote(HasuraClient),
    File(PathBuf),
}

impl Target {
    pub fn from_config(config: &TargetConfig) -> Self {
        match config {
            TargetConfig::Remote {
                endpoint,
                admin_secret,
            } => Self::Remote(HasuraClient::new(endpoint.clone(), admin_secret.clone())),
            TargetConfig::File(path) => Self::File(path.clone()),
        }
    }

    /// Read the current state of `collection`.
    pub async fn load(&self, collection: &str) -> Result<Snapshot> {
        match self {
            Self::Remote(client) => {
                let metadata = client.export_metadata().await?;
                Ok(Snapshot {
                    queries: metadata.queries(collection).to_vec(),
                    collection_exists: metadata.collection(collection).is_some(),
                    allow_listed: metadata.is_allow_listed(collection),
                    collections: Vec::new(),
                })
            }
            Self::File(path) => {
                let collections = match tokio::fs::read_to_string(path).await {
                    Ok(json) => read_collections(&json)?,
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        tracing::info!(path = %path.display(), "collection file not found, starting empty");
                        Vec::new()
                    }
                    Err(source) => {
                        return Err(AppError::Read {
                            path: path.clone(),
                            source,
                        })
                    }
                };
                let existing = collections.iter().find(|c| c.name == collection);
                Ok(Snapshot {
                    queries: existing
                        .map(|c| c.definition.queries.clone())
                        .unwrap_or_default(),
                    collection_exists: existing.is_some(),
                    allow_listed: true,
                    collections,
                })
            }
        }
    }

    /// Apply `plan` to `collection`, whose state was read as `snapshot`.
    pub async fn apply(
        &self,
        collection: &str,
        snapshot: &Snapshot,
        plan: &SyncPlan,
        reset: bool,
    ) -> Result<()> {
        if plan.is_empty() && snapshot.collection_exists && snapshot.allow_listed {
            tracing::info!(collection, "collection already in sync");
            return Ok(());
        }

        match self {
            Self::Remote(client) => apply_remote(client, collection, snapshot, plan, reset).await,
            Self::File(path) => {
                let mut collections = snapshot.collections.clone();
                upsert_collection(&mut collections, collection, plan.collection.clone());
                let json = collections_to_json(&collections)?;
                tokio::fs::write(path, json)
                    .await
                    .map_err(|source| AppError::Write {
                        path: path.clone(),
                        source,
                    })?;
                tracing::info!(path = %path.display(), queries = plan.collection.len(), "collection file written");
                Ok(())
            }
        }
    }
}

async fn apply_remote(
    client: &HasuraClient,
    collection: &str,
    snapshot: &Snapshot,
    plan: &SyncPlan,
    reset: bool,
) -> Result<()> {
    if reset || !snapshot.collection_exists {
        if snapshot.collection_exists {
            tracing::info!(collection, "dropping collection");
            client.drop_query_collection(collection).await?;
        }
        tracing::info!(collection, queries = plan.collection.len(), "creating collection");
        client
            .create_query_collection(collection, &plan.collection)
            .await?;
        // Dropping cascades to the allow-list.
        return client.add_collection_to_allowlist(collection).await;
    }

    try_join_all(
        plan.deleted
            .iter()
            .map(|entry| client.drop_query_from_collection(collection, &entry.name)),
    )
    .await?;

    if plan.versioned {
        try_join_all(
            plan.updated
                .iter()
                .map(|entry| client.add_query_to_collection(collection, entry)),
        )
        .await?;
    } else {
        try_join_all(
            plan.updated
                .iter()
                .map(|entry| client.replace_query_in_collection(collection, entry)),
        )
        .await?;
    }

    try_join_all(
        plan.added
            .iter()
            .map(|entry| client.add_query_to_collection(collection, entry)),
    )
    .await?;

    if !snapshot.allow_listed {
        client.add_collection_to_allowlist(collection).await?;
    }
    Ok(())
}
