//! Ollama clients: batch embeddings via `/api/embed`, generation via
//! `/api/chat`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::provider::{GenerateOptions, LlmError, LlmProvider};
use crate::traits::{ensure_dimensions, Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            dimensions,
        }
    }
}

#[derive(Deserialize)]
struct EmbedReply {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = json!({ "model": self.model, "input": texts });
        debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!(
                "ollama embed ({}): {status}: {detail}",
                self.model
            )));
        }

        let reply: EmbedReply = response.json().await?;
        if reply.embeddings.len() != texts.len() {
            return Err(EmbeddingError::Api(format!(
                "ollama returned {} embeddings for {} inputs",
                reply.embeddings.len(),
                texts.len()
            )));
        }
        ensure_dimensions(self.dimensions, &reply.embeddings)?;
        Ok(reply.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Generation provider backed by Ollama's chat endpoint.
pub struct OllamaProvider {
    client: Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            url,
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);

        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens,
            },
        });

        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Parse("missing message.content".into()))?
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_reply_parses_batched_vectors() {
        let reply: EmbedReply =
            serde_json::from_str(r#"{"embeddings":[[1.0,0.0],[0.0,1.0]]}"#).unwrap();
        assert_eq!(reply.embeddings.len(), 2);
        assert!(ensure_dimensions(2, &reply.embeddings).is_ok());
    }
}
