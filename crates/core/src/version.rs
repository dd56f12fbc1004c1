//! The frozen core's version stamp.
//!
//! Bumped only when the pattern catalog, tier taxonomy, or scoring
//! penalties change in a way that affects the meaning of a prior
//! evaluation. Stamped onto every `CoreEvaluation` and every
//! `AuditEntry` so that historical results remain interpretable.
pub const CORE_VERSION: &str = "1.0.0";
