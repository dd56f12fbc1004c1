//! Core types and frozen definitions for the distortion detection engine
//!
//! This crate provides the foundational vocabulary used across all other
//! crates in the workspace:
//! - The frozen taxonomy (`Principle`, `PitTier`, `Severity`, `KnowledgeType`)
//! - The data model of `StructuralPattern`, `Flag`, `CoreEvaluation`
//! - The governance record `LearnedPattern`
//! - The audit record `AuditEntry`
//! - The unified `ScanResult`
//! - Error types

pub mod audit_entry;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod flag;
pub mod learned_pattern;
pub mod pattern;
pub mod principle;
pub mod scan;
pub mod severity;
pub mod tier;
pub mod version;

pub use audit_entry::AuditEntry;
pub use domain::Domain;
pub use error::{Error, Result};
pub use evaluation::{CoreEvaluation, KnowledgeType};
pub use flag::{Flag, FlagCategory, FlagSource};
pub use learned_pattern::{LearnedPattern, PatternStatus};
pub use pattern::StructuralPattern;
pub use principle::Principle;
pub use scan::{ImpactProjection, PenaltyLine, ScanMode, ScanResult, ScoreBreakdown};
pub use severity::Severity;
pub use tier::PitTier;
pub use version::CORE_VERSION;
