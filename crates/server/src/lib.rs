//! HTTP API for the detection engine.
//!
//! A thin axum app wiring the orchestrator (scan/correct), the audit
//! chain (append-only log + integrity verification), and the learning
//! ring together behind four routes. No auth, no rate limiting, no
//! response caching: those live in front of this service, not in it.

pub mod error;
pub mod http;
pub mod state;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;
