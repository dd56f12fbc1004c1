//! The append-only, SHA-256 hash-chained audit log.
//!
//! [`AuditChain`] is the only way to add or read audit records. Entries
//! are never updated or deleted; [`AuditChain::verify`] recomputes the
//! chain over a window of entries and reports exactly which links, if
//! any, fail to match.

pub mod canonical;
pub mod chain;
pub mod error;

pub use canonical::canonical_json;
pub use chain::{AuditChain, BrokenLink, FailureMode, VerificationReport};
pub use error::AuditError;
