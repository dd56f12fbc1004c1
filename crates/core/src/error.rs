//! Error types shared across the detection engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    #[error("unknown scan mode: {0}")]
    UnknownScanMode(String),

    #[error("pattern registry error: {0}")]
    Registry(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
