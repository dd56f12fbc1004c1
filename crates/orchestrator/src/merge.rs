//! Merge rules: how a deep-analysis result and the evaluator's local
//! result combine into one `ScanResult`.

use veritas_core::{CoreEvaluation, Flag, KnowledgeType, PitTier, Severity};

use crate::deep::DeepAnalysis;

pub struct MergedFields {
    pub severity: Option<Severity>,
    pub pit_tier: Option<String>,
    pub pit_detail: Option<PitTier>,
    pub knowledge_type: KnowledgeType,
    pub confidence: f64,
    pub explanation: String,
    pub flags: Vec<Flag>,
}

/// Worst-case severity across core flags, AI flags, and the deep
/// result's own severity verdict. `None` iff nothing reported a
/// severity at all.
fn worst_severity(core_flags: &[Flag], ai_flags: &[Flag], deep_severity: Option<Severity>) -> Option<Severity> {
    core_flags
        .iter()
        .map(|f| f.severity)
        .chain(ai_flags.iter().map(|f| f.severity))
        .chain(deep_severity)
        .max()
}

/// Combines the evaluator's local output with an optional deep-analysis
/// result per merge rules (a)-(f). Rule (g), `source`, is the caller's
/// responsibility since it also depends on whether the call degraded.
pub fn merge(evaluation: &CoreEvaluation, ai_flags: Vec<Flag>, deep: Option<&DeepAnalysis>) -> MergedFields {
    let severity = worst_severity(&evaluation.flags, &ai_flags, deep.and_then(|d| d.severity));

    let (pit_tier, pit_detail) = match deep.and_then(|d| d.pit_tier) {
        Some(tier) => (Some(tier.label()), Some(tier)),
        None => (
            evaluation.pit_tier_active.clone(),
            evaluation
                .pit_tier_active
                .as_deref()
                .and_then(|label| label.split('_').nth(1))
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(PitTier::from_u8),
        ),
    };

    let knowledge_type = deep.and_then(|d| d.knowledge_type).unwrap_or(evaluation.knowledge_type);
    let confidence = deep.and_then(|d| d.confidence).unwrap_or(0.0).max(evaluation.confidence);
    let explanation = deep
        .and_then(|d| d.explanation.clone())
        .unwrap_or_else(|| evaluation.summary.clone());

    let mut flags = evaluation.flags.clone();
    flags.extend(ai_flags);

    MergedFields { severity, pit_tier, pit_detail, knowledge_type, confidence, explanation, flags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_core::{Domain, Principle};

    fn evaluation_with(flags: Vec<Flag>) -> CoreEvaluation {
        veritas_detect::evaluate(
            if flags.is_empty() { "clean text with nothing unusual going on today." } else { "studies show everyone agrees this is settled" },
            Domain::General,
            &[],
        )
    }

    #[test]
    fn local_only_merge_passes_through_evaluator_fields() {
        let evaluation = evaluation_with(vec![]);
        let merged = merge(&evaluation, vec![], None);
        assert_eq!(merged.knowledge_type, evaluation.knowledge_type);
        assert_eq!(merged.explanation, evaluation.summary);
    }

    #[test]
    fn deep_severity_overrides_when_more_severe_than_local() {
        let evaluation = evaluation_with(vec![]);
        let deep = DeepAnalysis { severity: Some(Severity::Critical), ..Default::default() };
        let merged = merge(&evaluation, vec![], Some(&deep));
        assert_eq!(merged.severity, Some(Severity::Critical));
    }

    #[test]
    fn ai_flags_are_appended_after_core_flags() {
        let evaluation = evaluation_with(vec![]);
        let ai_flag = Flag::structural("AI_X", "text", PitTier::Tier1, Severity::Low, "d", Principle::Truth);
        let merged = merge(&evaluation, vec![ai_flag.clone()], None);
        assert_eq!(merged.flags.len(), evaluation.flags.len() + 1);
        assert_eq!(merged.flags.last().unwrap().pattern_id, ai_flag.pattern_id);
    }
}
