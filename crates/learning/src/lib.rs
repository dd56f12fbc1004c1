//! The governed learning ring: patterns proposed by deep
//! analysis pass through staging -> active -> deactivated, gated by
//! confirmation counts and false-positive rate, never by redefining
//! what a distortion is.

pub mod error;
pub mod ring;

pub use error::LearningError;
pub use ring::LearningRing;
