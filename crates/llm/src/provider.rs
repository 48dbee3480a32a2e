use async_trait::async_trait;
use thiserror::Error;

/// Sampling options for a generation request.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Trait for text-generation providers. Outside the ingestion path; consumed
/// by retrieval-augmented callers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a prompt and return the model's response text.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, LlmError>;
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}
