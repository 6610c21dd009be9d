//! Hasura metadata API client.
//!
//! Every call is a JSON `POST` of `{"type": ..., "args": ...}` to
//! `<endpoint>/v1/query` with admin credentials.

use crate::error::{AppError, Result};
use allowlist_engine::{Metadata, QueryEntry};
use serde::Serialize;

/// A metadata API request body.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum MetadataRequest<'a> {
    ExportMetadata {},
    CreateQueryCollection {
        name: &'a str,
        definition: CollectionDefinition<'a>,
    },
    DropQueryCollection {
        collection: &'a str,
        cascade: bool,
    },
    AddQueryToCollection {
        collection_name: &'a str,
        query_name: &'a str,
        query: &'a str,
    },
    DropQueryFromCollection {
        collection_name: &'a str,
        query_name: &'a str,
    },
    AddCollectionToAllowlist {
        collection: &'a str,
    },
}

#[derive(Debug, Serialize)]
pub struct CollectionDefinition<'a> {
    pub queries: &'a [QueryEntry],
}

impl MetadataRequest<'_> {
    /// The request `type`, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExportMetadata {} => "export_metadata",
            Self::CreateQueryCollection { .. } => "create_query_collection",
            Self::DropQueryCollection { .. } => "drop_query_collection",
            Self::AddQueryToCollection { .. } => "add_query_to_collection",
            Self::DropQueryFromCollection { .. } => "drop_query_from_collection",
            Self::AddCollectionToAllowlist { .. } => "add_collection_to_allowlist",
        }
    }
}

/// Client for one Hasura instance.
#[derive(Debug, Clone)]
pub struct HasuraClient {
    http: reqwest::Client,
    endpoint: String,
    admin_secret: Option<String>,
}

impl HasuraClient {
    pub fn new(endpoint: impl Into<String>, admin_secret: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            admin_secret,
        }
    }

    /// URL every request is posted to.
    pub fn url(&self) -> String {
        format!("{}/v1/query", self.endpoint)
    }

    async fn send(&self, request: &MetadataRequest<'_>) -> Result<serde_json::Value> {
        let mut builder = self
            .http
            .post(self.url())
            .header("X-Hasura-Role", "admin")
            .json(request);
        if let Some(secret) = &self.admin_secret {
            builder = builder.header("x-hasura-admin-secret", secret);
        }

        tracing::debug!(request = request.kind(), "calling Hasura");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Hasura {
                request: request.kind(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch the current metadata.
    pub async fn export_metadata(&self) -> Result<Metadata> {
        let value = self.send(&MetadataRequest::ExportMetadata {}).await?;
        Ok(Metadata::from_value(value)?)
    }

    /// Create a collection holding `queries`.
    pub async fn create_query_collection(&self, name: &str, queries: &[QueryEntry]) -> Result<()> {
        self.send(&MetadataRequest::CreateQueryCollection {
            name,
            definition: CollectionDefinition { queries },
        })
        .await?;
        Ok(())
    }

    /// Drop a collection and its allow-list reference.
    pub async fn drop_query_collection(&self, collection: &str) -> Result<()> {
        self.send(&MetadataRequest::DropQueryCollection {
            collection,
            cascade: true,
        })
        .await?;
        Ok(())
    }

    pub async fn add_query_to_collection(&self, collection: &str, entry: &QueryEntry) -> Result<()> {
        self.send(&MetadataRequest::AddQueryToCollection {
            collection_name: collection,
            query_name: &entry.name,
            query: &entry.query,
        })
        .await?;
        Ok(())
    }

    pub async fn drop_query_from_collection(&self, collection: &str, name: &str) -> Result<()> {
        self.send(&MetadataRequest::DropQueryFromCollection {
            collection_name: collection,
            query_name: name,
        })
        .await?;
        Ok(())
    }

    /// Replace a published query: drop it, then add the new text.
    pub async fn replace_query_in_collection(
        &self,
        collection: &str,
        entry: &QueryEntry,
    ) -> Result<()> {
        self.drop_query_from_collection(collection, &entry.name)
            .await?;
        self.add_query_to_collection(collection, entry).await
    }

    pub async fn add_collection_to_allowlist(&self, collection: &str) -> Result<()> {
        self.send(&MetadataRequest::AddCollectionToAllowlist { collection })
            .await?;
        Ok(())
    }
}
