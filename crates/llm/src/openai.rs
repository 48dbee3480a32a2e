//! OpenAI-compatible embedding backend.
//!
//! Speaks the `/v1/embeddings` protocol, so it also covers self-hosted
//! servers exposing the same endpoint. The response carries an `index` per
//! row; rows are put back in input order before the vectors are returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::traits::{ensure_dimensions, Embedder, EmbeddingError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            dimensions,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorder rows by their `index` field and unwrap the vectors. The endpoint
/// may answer out of order; callers rely on vectors lining up with inputs.
fn vectors_in_input_order(
    mut rows: Vec<EmbeddingRow>,
    inputs: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if rows.len() != inputs {
        return Err(EmbeddingError::Api(format!(
            "embeddings endpoint returned {} rows for {} inputs",
            rows.len(),
            inputs
        )));
    }
    rows.sort_by_key(|row| row.index);
    Ok(rows.into_iter().map(|row| row.embedding).collect())
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = json!({ "model": self.model, "input": texts });
        debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {detail}")));
        }

        let reply: EmbeddingsReply = response.json().await?;
        let vectors = vectors_in_input_order(reply.data, texts.len())?;
        ensure_dimensions(self.dimensions, &vectors)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_reordered_by_index() {
        let reply: EmbeddingsReply = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#,
        )
        .unwrap();
        let vectors = vectors_in_input_order(reply.data, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn row_count_mismatch_is_an_api_error() {
        let rows = vec![EmbeddingRow {
            index: 0,
            embedding: vec![1.0],
        }];
        let err = vectors_in_input_order(rows, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::Api(_)));
    }
}
