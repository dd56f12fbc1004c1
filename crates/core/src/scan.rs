use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::evaluation::KnowledgeType;
use crate::flag::Flag;
use crate::severity::Severity;
use crate::tier::PitTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Local,
    Deep,
    Full,
}

impl ScanMode {
    pub fn parse(s: &str) -> Result<ScanMode, Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ScanMode::Local),
            "deep" => Ok(ScanMode::Deep),
            "full" => Ok(ScanMode::Full),
            other => Err(Error::UnknownScanMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Local => "local",
            ScanMode::Deep => "deep",
            ScanMode::Full => "full",
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named penalty line item contributing to the final truth score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyLine {
    pub label: String,
    pub amount: i32,
}

/// Full accounting of how a truth score was derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub starting_score: i32,
    pub penalties: Vec<PenaltyLine>,
    pub final_score: i32,
}

impl ScoreBreakdown {
    pub fn total_penalty(&self) -> i32 {
        self.penalties.iter().map(|p| p.amount).sum()
    }
}

/// Two named narratives projecting the downstream effect of the
/// detected distortion if left uncorrected vs. corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactProjection {
    pub status_quo_path: String,
    pub corrected_path: String,
}

/// The unified output of a scan, regardless of which mode produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub text: String,
    pub truth_score: i32,
    pub knowledge_type: KnowledgeType,
    pub bias_detected: bool,
    pub bias_types: BTreeSet<String>,
    pub pit_tier: Option<String>,
    pub pit_detail: Option<PitTier>,
    pub severity: Option<Severity>,
    pub confidence: f64,
    pub explanation: String,
    pub flags: Vec<Flag>,
    pub impact_projection: Option<ImpactProjection>,
    pub scan_mode: String,
    pub source: String,
    pub core_version: String,
    pub audit_hash: Option<String>,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub learning_proposals: Option<Vec<String>>,
    /// Set when a deep/full scan's LLM call failed and the orchestrator
    /// fell back to the local-only result.
    #[serde(default)]
    pub degraded: bool,
}
