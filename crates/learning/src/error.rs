#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error("learning store error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("unknown pattern id: {0}")]
    UnknownPattern(String),
}

impl From<LearningError> for veritas_core::Error {
    fn from(e: LearningError) -> Self {
        veritas_core::Error::Storage(e.to_string())
    }
}
