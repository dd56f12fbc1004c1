//! The deterministic half of the detection engine: evaluator and
//! scorer. Both are pure functions; neither performs I/O.

pub mod evaluator;
pub mod scorer;

pub use evaluator::evaluate;
pub use scorer::{score, DeepAnalysisInput};
