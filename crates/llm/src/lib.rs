//! LLM provider abstraction: the detection engine's collaborator
//! interface for deep analysis, correction, and pattern proposals.
//!
//! The core never talks to a vendor SDK directly: it depends on the
//! narrow [`LlmProvider`] trait, wrapped in a [`CircuitBreaker`] shared
//! across callers. [`GeminiBackend`] is the one concrete implementation
//! shipped here; retry with backoff happens inside it, before the
//! breaker ever sees an outcome.

pub mod breaker;
pub mod error;
pub mod gemini;
pub mod provider;

pub use breaker::{CircuitBreaker, SharedProvider};
pub use error::LlmError;
pub use gemini::GeminiBackend;
pub use provider::{parse_json_response, GenerateRequest, LlmProvider};
