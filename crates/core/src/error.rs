use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaglineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("embedding failure: {0}")]
    Embedding(String),

    #[error("store write failure: {0}")]
    StoreWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
