use serde::{Deserialize, Serialize};

use crate::flag::Flag;
use crate::principle::Principle;

/// Coarse classification of how a passage relates to evidence.
///
/// `Revelation` is never produced by the local evaluator (it only
/// derives `Neutral`/`Mixed`/`Sense`); it is a value the deep-analysis
/// LLM may assert and the orchestrator may adopt in its merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeType {
    Neutral,
    Mixed,
    Sense,
    Revelation,
}

impl KnowledgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeType::Neutral => "neutral",
            KnowledgeType::Mixed => "mixed",
            KnowledgeType::Sense => "sense",
            KnowledgeType::Revelation => "revelation",
        }
    }

    pub fn parse(s: &str) -> Option<KnowledgeType> {
        match s.to_lowercase().as_str() {
            "neutral" => Some(KnowledgeType::Neutral),
            "mixed" => Some(KnowledgeType::Mixed),
            "sense" => Some(KnowledgeType::Sense),
            "revelation" => Some(KnowledgeType::Revelation),
            _ => None,
        }
    }
}

impl std::fmt::Display for KnowledgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The pure output of the evaluator: a deterministic function of
/// `text`, `domain`, and the active pattern set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreEvaluation {
    pub aligned: bool,
    pub knowledge_type: KnowledgeType,
    pub confidence: f64,
    pub flags: Vec<Flag>,
    pub primary_principle: Principle,
    /// Dominant tier label (e.g. `tier_2_psychological`), or `None` if
    /// there were no flags to weigh.
    pub pit_tier_active: Option<String>,
    pub summary: String,
    pub core_version: String,
}

impl CoreEvaluation {
    pub fn structural_count(&self) -> usize {
        self.flags.iter().filter(|f| f.is_structural()).count()
    }

    pub fn marker_count(&self) -> usize {
        self.flags.len() - self.structural_count()
    }
}
