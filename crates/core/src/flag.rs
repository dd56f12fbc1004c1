use serde::{Deserialize, Serialize};

use crate::principle::Principle;
use crate::severity::Severity;
use crate::tier::PitTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    Structural,
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSource {
    Core,
    Ai,
}

/// A single detection event, surfaced by either the frozen evaluator
/// or an LLM's deep-analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    pub category: FlagCategory,
    pub pattern_id: String,
    pub matched_text: String,
    pub pit_tier: PitTier,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub principle: Option<Principle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<FlagSource>,
}

/// Truncation limit applied to every `matched_text`, per the data model.
pub const MATCHED_TEXT_LIMIT: usize = 120;

/// Truncate `text` to at most `MATCHED_TEXT_LIMIT` chars, respecting
/// UTF-8 character boundaries.
pub fn truncate_matched_text(text: &str) -> String {
    if text.chars().count() <= MATCHED_TEXT_LIMIT {
        return text.to_string();
    }
    text.chars().take(MATCHED_TEXT_LIMIT).collect()
}

impl Flag {
    pub fn structural(
        pattern_id: impl Into<String>,
        matched_text: &str,
        pit_tier: PitTier,
        severity: Severity,
        description: impl Into<String>,
        principle: Principle,
    ) -> Self {
        Self {
            category: FlagCategory::Structural,
            pattern_id: pattern_id.into(),
            matched_text: truncate_matched_text(matched_text),
            pit_tier,
            severity,
            description: description.into(),
            principle: Some(principle),
            source: Some(FlagSource::Core),
        }
    }

    pub fn marker(pattern_id: impl Into<String>, matched_text: &str, description: impl Into<String>) -> Self {
        Self {
            category: FlagCategory::Marker,
            pattern_id: pattern_id.into(),
            matched_text: truncate_matched_text(matched_text),
            pit_tier: PitTier::Tier1,
            severity: Severity::Low,
            description: description.into(),
            principle: None,
            source: Some(FlagSource::Core),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self.category, FlagCategory::Structural)
    }

    pub fn is_ai(&self) -> bool {
        matches!(self.source, Some(FlagSource::Ai))
    }
}
