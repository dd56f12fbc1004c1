#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Llm(#[from] veritas_llm::LlmError),

    #[error(transparent)]
    Audit(#[from] veritas_audit::AuditError),

    #[error(transparent)]
    Learning(#[from] veritas_learning::LearningError),
}

impl From<OrchestratorError> for veritas_core::Error {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::InvalidInput(msg) => veritas_core::Error::InvalidInput(msg),
            other => veritas_core::Error::Registry(other.to_string()),
        }
    }
}
