use thiserror::Error;

/// Crate-wide error type. Transport-layer and provider failures are
/// handled by returning empty results (see `newsintel-adapters`) rather
/// than surfacing here; this enum covers failures that genuinely abort
/// an operation.
#[derive(Error, Debug)]
pub enum NewsIntelError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index commit failed: {0}")]
    Index(String),

    #[error("verdict adapter failed: {0}")]
    Verdict(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NewsIntelError>;
