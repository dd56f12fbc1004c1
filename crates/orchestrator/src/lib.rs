//! Coordinates the frozen detection engine with its LLM-backed
//! collaborators: scan-mode dispatch, iterative correction, and
//! pattern proposal. None of this is part of the frozen core; all of
//! it is replaceable without bumping `core_version`.

pub mod correction;
pub mod deep;
pub mod error;
pub mod merge;
pub mod proposer;
pub mod scan;

pub use correction::{correct, CorrectionResult, DiffOp, DiffSpan};
pub use error::OrchestratorError;
pub use scan::Orchestrator;
