use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub reader: ReaderConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            chunking: ChunkingConfig::from_env(),
            reader: ReaderConfig::from_env(),
            embedding: EmbeddingConfig::from_env(),
            llm: LlmConfig::from_env(),
            store: StoreConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            reader: ReaderConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Hard upper bound on chunk length in characters (a single oversized
    /// sentence is still emitted whole rather than truncated).
    pub max_chunk_size: usize,
    /// Advisory lower bound; a quality signal, never forces merging.
    pub min_chunk_size: usize,
    /// Paragraphs longer than this are split at sentence boundaries.
    pub sentence_threshold: usize,
}

impl ChunkingConfig {
    fn from_env() -> Self {
        Self {
            max_chunk_size: env_usize("MAX_CHUNK_SIZE", 1000),
            min_chunk_size: env_usize("MIN_CHUNK_SIZE", 200),
            sentence_threshold: env_usize("SENTENCE_THRESHOLD", 500),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            min_chunk_size: 200,
            sentence_threshold: 500,
        }
    }
}

// ── Reader ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Extension allow-list, lowercased without dots.
    pub supported_file_types: Vec<String>,
    /// Files larger than this are skipped during directory runs.
    pub max_file_size: u64,
    pub recursive: bool,
    pub skip_hidden: bool,
    /// Fallback when strict UTF-8 decoding fails: "lossy" substitutes
    /// invalid sequences, anything else makes decoding a hard failure.
    pub default_encoding: String,
}

impl ReaderConfig {
    fn from_env() -> Self {
        Self {
            supported_file_types: env_or("SUPPORTED_FILE_TYPES", "txt,md,markdown,pdf")
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            max_file_size: env_u64("MAX_FILE_SIZE", 10 * 1024 * 1024),
            recursive: env_bool("READER_RECURSIVE", true),
            skip_hidden: env_bool("READER_SKIP_HIDDEN", true),
            default_encoding: env_or("DEFAULT_ENCODING", "utf-8"),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            supported_file_types: vec![
                "txt".into(),
                "md".into(),
                "markdown".into(),
                "pdf".into(),
            ],
            max_file_size: 10 * 1024 * 1024,
            recursive: true,
            skip_hidden: true,
            default_encoding: "utf-8".into(),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai".
    pub backend: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    /// LRU embedding cache entries (0 disables the cache).
    pub cache_capacity: usize,
}

impl EmbeddingConfig {
    fn from_env() -> Self {
        Self {
            backend: env_or("EMBEDDING_BACKEND", "ollama"),
            base_url: env_or("EMBEDDING_BASE_URL", "http://localhost:11434"),
            model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
            api_key: env_opt("EMBEDDING_API_KEY"),
            dimensions: env_usize("EMBEDDING_DIMENSIONS", 768),
            cache_capacity: env_usize("EMBEDDING_CACHE_CAPACITY", 1024),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "ollama".into(),
            base_url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            api_key: None,
            dimensions: 768,
            cache_capacity: 1024,
        }
    }
}

// ── Generation LLM ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("LLM_BASE_URL", "http://localhost:11434"),
            model: env_or("LLM_MODEL", "llama3.2"),
            temperature: env_opt("LLM_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
            max_tokens: env_opt("LLM_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

// ── Vector store ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" (local JSON persistence) or "chroma" (HTTP).
    pub backend: String,
    pub url: String,
    /// Directory for the local backend's persisted collections.
    pub persist_directory: String,
    pub collection_name: String,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            backend: env_or("STORE_BACKEND", "memory"),
            url: env_or("STORE_URL", "http://localhost:8000"),
            persist_directory: env_or("STORE_PERSIST_DIRECTORY", "data/vector_store"),
            collection_name: env_or("STORE_COLLECTION", "documents"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".into(),
            url: "http://localhost:8000".into(),
            persist_directory: "data/vector_store".into(),
            collection_name: "documents".into(),
        }
    }
}
