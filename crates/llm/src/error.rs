use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("circuit breaker is open")]
    CircuitOpen,
}

impl LlmError {
    /// Transient failures per the collaborator interface's retry contract:
    /// HTTP 429/500/503, or a message mentioning rate/quota/timeout/
    /// unavailable/overloaded.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::Timeout => true,
            LlmError::Api { status, message } => {
                matches!(status, 429 | 500 | 503) || Self::message_suggests_transient(message)
            }
            LlmError::InvalidResponse(message) => Self::message_suggests_transient(message),
            LlmError::Configuration(_) | LlmError::CircuitOpen => false,
        }
    }

    fn message_suggests_transient(message: &str) -> bool {
        let lower = message.to_lowercase();
        ["rate", "quota", "timeout", "unavailable", "overloaded"]
            .iter()
            .any(|needle| lower.contains(needle))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for veritas_core::Error {
    fn from(err: LlmError) -> Self {
        veritas_core::Error::Llm(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_is_transient() {
        let err = LlmError::Api { status: 429, message: "too many requests".into() };
        assert!(err.is_transient());
    }

    #[test]
    fn configuration_errors_are_terminal() {
        let err = LlmError::Configuration("missing api key".into());
        assert!(!err.is_transient());
    }

    #[test]
    fn message_keyword_marks_transient_even_on_other_status() {
        let err = LlmError::Api { status: 400, message: "model is overloaded, try later".into() };
        assert!(err.is_transient());
    }
}
