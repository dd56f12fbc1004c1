//! The scorer: reduces evaluator output plus optional deep-analysis
//! input into a 0-100 truth score with a full penalty breakdown.

use std::collections::BTreeSet;

use veritas_core::{CoreEvaluation, Flag, FlagCategory, PenaltyLine, Severity, ScoreBreakdown};

/// Optional deep-analysis contribution to the score.
#[derive(Debug, Clone, Default)]
pub struct DeepAnalysisInput {
    pub severity: Option<Severity>,
    pub bias_types: Vec<String>,
}

fn structural_penalty(severity: Severity) -> i32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 20,
        Severity::Moderate => 14,
        Severity::Low => 8,
    }
}

fn ai_flag_penalty(severity: Severity) -> i32 {
    match severity {
        Severity::Critical => 14,
        Severity::High => 10,
        Severity::Moderate => 6,
        Severity::Low => 3,
    }
}

fn deep_severity_penalty(severity: Severity) -> i32 {
    match severity {
        Severity::Critical => 20,
        Severity::High => 15,
        Severity::Moderate => 8,
        Severity::Low => 4,
    }
}

fn tier_penalty(tier_num: u8) -> i32 {
    match tier_num {
        1 => 10,
        2 => 7,
        3 => 4,
        _ => 0,
    }
}

/// Score `evaluation` plus optional deep-analysis result and AI flags.
/// `ai_flags` are flags already extracted and normalized by the
/// orchestrator from the LLM's response.
pub fn score(
    evaluation: &CoreEvaluation,
    deep: Option<&DeepAnalysisInput>,
    ai_flags: &[Flag],
) -> (i32, ScoreBreakdown) {
    let mut penalties: Vec<PenaltyLine> = Vec::new();
    let mut tier_set: BTreeSet<u8> = BTreeSet::new();

    for flag in &evaluation.flags {
        match flag.category {
            FlagCategory::Structural => {
                let amount = structural_penalty(flag.severity);
                penalties.push(PenaltyLine {
                    label: format!("structural:{}", flag.pattern_id),
                    amount,
                });
                tier_set.insert(flag.pit_tier.as_u8());
            }
            FlagCategory::Marker => {
                penalties.push(PenaltyLine {
                    label: format!("marker:{}", flag.pattern_id),
                    amount: 4,
                });
            }
        }
    }

    if let Some(tier_label) = &evaluation.pit_tier_active {
        if let Some(tier_num) = parse_tier_number(tier_label) {
            penalties.push(PenaltyLine {
                label: "dominant_tier".to_string(),
                amount: tier_penalty(tier_num),
            });
        }
    }

    if tier_set.len() > 1 {
        penalties.push(PenaltyLine {
            label: "multi_tier_span".to_string(),
            amount: 5 * (tier_set.len() as i32 - 1),
        });
    }

    for flag in ai_flags {
        penalties.push(PenaltyLine {
            label: format!("ai_flag:{}", flag.pattern_id),
            amount: ai_flag_penalty(flag.severity),
        });
    }

    if let Some(deep) = deep {
        if let Some(severity) = deep.severity {
            penalties.push(PenaltyLine {
                label: "deep_severity".to_string(),
                amount: deep_severity_penalty(severity),
            });
        }
        let distinct_types: BTreeSet<&str> = deep
            .bias_types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != "none")
            .collect();
        if !distinct_types.is_empty() {
            penalties.push(PenaltyLine {
                label: "deep_bias_types".to_string(),
                amount: 4 * distinct_types.len() as i32,
            });
        }
    }

    let starting_score = 100;
    let total_penalty: i32 = penalties.iter().map(|p| p.amount).sum();
    let final_score = (starting_score - total_penalty).clamp(0, 100);

    let breakdown = ScoreBreakdown {
        starting_score,
        penalties,
        final_score,
    };

    (final_score, breakdown)
}

fn parse_tier_number(label: &str) -> Option<u8> {
    label.split('_').nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_core::{Domain, KnowledgeType};

    fn clean_evaluation() -> CoreEvaluation {
        CoreEvaluation {
            aligned: true,
            knowledge_type: KnowledgeType::Neutral,
            confidence: 0.9,
            flags: vec![],
            primary_principle: veritas_core::Principle::Truth,
            pit_tier_active: None,
            summary: "clean".to_string(),
            core_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn no_flags_scores_one_hundred() {
        let (final_score, breakdown) = score(&clean_evaluation(), None, &[]);
        assert_eq!(final_score, 100);
        assert_eq!(breakdown.total_penalty(), 0);
    }

    #[test]
    fn clamps_to_zero_when_penalties_exceed_one_hundred() {
        let eval = crate::evaluator::evaluate(
            "It is well-settled law that this claim is plainly meritless. \
             Everyone agrees this is settled. If we do not act now, the consequences will be catastrophic. \
             Studies show experts agree that this is obvious.",
            Domain::Auto,
            &[],
        );
        let (final_score, _) = score(&eval, Some(&DeepAnalysisInput {
            severity: Some(Severity::Critical),
            bias_types: vec!["propaganda".into(), "fearmongering".into(), "appeal_to_authority".into()],
        }), &[]);
        assert!(final_score >= 0);
    }

    #[test]
    fn legal_scenario_scores_below_seventy() {
        let eval = crate::evaluator::evaluate(
            "It is well-settled law that this claim is plainly meritless.",
            Domain::Legal,
            &[],
        );
        let (final_score, _) = score(&eval, None, &[]);
        assert!(final_score < 70, "expected < 70, got {final_score}");
    }

    #[test]
    fn multi_tier_scenario_scores_at_most_fifty_five() {
        let eval = crate::evaluator::evaluate(
            "Everyone agrees this is settled. If we do not act now, the consequences will be catastrophic.",
            Domain::General,
            &[],
        );
        let (final_score, _) = score(&eval, None, &[]);
        assert!(final_score <= 55, "expected <= 55, got {final_score}");
    }
}
