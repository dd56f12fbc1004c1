use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::principle::Principle;
use crate::severity::Severity;
use crate::tier::PitTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    Staging,
    Active,
    Deactivated,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternStatus::Staging => "staging",
            PatternStatus::Active => "active",
            PatternStatus::Deactivated => "deactivated",
        }
    }

    pub fn parse(s: &str) -> Option<PatternStatus> {
        match s.to_lowercase().as_str() {
            "staging" => Some(PatternStatus::Staging),
            "active" => Some(PatternStatus::Active),
            "deactivated" => Some(PatternStatus::Deactivated),
            _ => None,
        }
    }
}

/// A pattern proposed by deep analysis, tracked through its governance
/// lifecycle: staging → active → deactivated. Durable; survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pit_tier: PitTier,
    pub severity: Severity,
    pub principle: Principle,
    pub regex_source: String,
    pub min_matches: usize,
    pub suppress_if_cited: bool,

    pub status: PatternStatus,
    pub confirmations: u32,
    pub false_positives: u32,
    pub total_evaluations: u32,
    pub proposed_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub source_scan_hash: String,
}

impl LearnedPattern {
    pub fn new(
        id: String,
        name: String,
        description: String,
        pit_tier: PitTier,
        severity: Severity,
        principle: Principle,
        regex_source: String,
        source_scan_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            pit_tier,
            severity,
            principle,
            regex_source,
            min_matches: 1,
            suppress_if_cited: false,
            status: PatternStatus::Staging,
            confirmations: 1,
            false_positives: 0,
            total_evaluations: 0,
            proposed_at: now,
            activated_at: None,
            deactivated_at: None,
            source_scan_hash,
        }
    }

    pub fn false_positive_rate(&self) -> f64 {
        if self.total_evaluations == 0 {
            0.0
        } else {
            self.false_positives as f64 / self.total_evaluations as f64
        }
    }
}
