//! Chroma HTTP client.
//!
//! Collections are addressed by name at this level; the client resolves the
//! server-side collection id per call. Writes go through the upsert endpoint,
//! so re-ingestion with stable ids updates records in place.

use async_trait::async_trait;
use ragline_core::{EmbeddingRecord, Metadata};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{SearchResult, StoreError, VectorStore};

pub struct ChromaStore {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<Option<Metadata>>>,
    distances: Vec<Vec<f32>>,
}

impl ChromaStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Resolve a collection's server-side id by name.
    async fn collection_id(&self, name: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/collections/{name}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Parse(format!("{status}: {body}")));
        }

        let info: CollectionInfo = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(info.id)
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        let body = json!({ "name": name, "get_or_create": true });
        let response = self
            .client
            .post(self.url("/collections"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!(
                "create collection {name}: {status}: {body}"
            )));
        }
        debug!(collection = name, "collection ready");
        Ok(())
    }

    async fn add_documents(
        &self,
        collection: &str,
        records: &[EmbeddingRecord],
    ) -> Result<Vec<String>, StoreError> {
        let id = self.collection_id(collection).await?;

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let body = json!({
            "ids": ids,
            "embeddings": records.iter().map(|r| &r.vector).collect::<Vec<_>>(),
            "documents": records.iter().map(|r| &r.content).collect::<Vec<_>>(),
            "metadatas": records.iter().map(|r| &r.metadata).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(self.url(&format!("/collections/{id}/upsert")))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!(
                "upsert into {collection}: {status}: {body}"
            )));
        }

        Ok(records.iter().map(|r| r.id.clone()).collect())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let id = self.collection_id(collection).await?;

        let mut body = json!({
            "query_embeddings": [query_vector],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(filter) = filter {
            body["where"] = json!(filter);
        }

        let response = self
            .client
            .post(self.url(&format!("/collections/{id}/query")))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Parse(format!(
                "query {collection}: {status}: {body}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        // Single query vector, so results live in the first row of each field.
        let documents = parsed.documents.into_iter().next().unwrap_or_default();
        let metadatas = parsed.metadatas.into_iter().next().unwrap_or_default();
        let distances = parsed.distances.into_iter().next().unwrap_or_default();

        Ok(documents
            .into_iter()
            .zip(metadatas)
            .zip(distances)
            .map(|((content, metadata), distance)| SearchResult {
                content,
                metadata: metadata.unwrap_or_default(),
                distance,
            })
            .collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/collections/{name}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!(
                "delete collection {name}: {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let response = self.client.get(self.url("/collections")).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Parse(format!("{status}: {body}")));
        }

        let infos: Vec<CollectionInfo> = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(infos.into_iter().map(|c| c.name).collect())
    }
}
