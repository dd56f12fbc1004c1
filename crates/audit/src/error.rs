//! Error type for the audit chain.

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("chain integrity violation: {0}")]
    ChainIntegrity(String),

    #[error("invalid audit data: {0}")]
    InvalidData(String),
}

impl From<AuditError> for veritas_core::Error {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::ChainIntegrity(msg) => veritas_core::Error::ChainIntegrity(msg),
            other => veritas_core::Error::Storage(other.to_string()),
        }
    }
}
