//! Domain overlay for legal text: filings, demand letters, legal
//! commentary.

use veritas_core::{Principle, Severity, StructuralPattern};
use veritas_core::PitTier;

pub fn patterns() -> Vec<StructuralPattern> {
    vec![
        StructuralPattern::new(
            "LEGAL_SETTLED_DISMISSAL",
            "Unsupported settled-law assertion",
            "Claims an issue is settled law without naming the authority",
            PitTier::Tier3,
            Severity::High,
            Principle::Justice,
            &[
                r"\bwell[- ]settled law\b",
                r"\bit is well established that\b",
                r"\bblack letter law\b",
            ],
            1,
            true,
        ),
        StructuralPattern::new(
            "LEGAL_MERIT_DISMISSAL",
            "Conclusory merit dismissal",
            "Declares a claim meritless without supporting argument",
            PitTier::Tier2,
            Severity::Critical,
            Principle::Justice,
            &[
                r"\bplainly meritless\b",
                r"\butterly without merit\b",
                r"\bpatently frivolous\b",
                r"\bwholly without merit\b",
                r"\bfrivolous on its face\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "LEGAL_CHILLING_THREAT",
            "Chilling litigation threat",
            "Threatens broad legal escalation to discourage a position",
            PitTier::Tier2,
            Severity::High,
            Principle::Agency,
            &[
                r"\bwill pursue all available remedies\b",
                r"\bwill not hesitate to litigate\b",
                r"\breserves the right to take further action\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "LEGAL_PRESUMED_GUILT",
            "Presumed guilt",
            "Asserts guilt as beyond question before any adjudication",
            PitTier::Tier1,
            Severity::High,
            Principle::Justice,
            &[
                r"\bthere is no question that the defendant\b",
                r"\bclearly guilty\b",
                r"\bguilt is beyond dispute\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "LEGAL_SLIPPERY_SLOPE",
            "Legal slippery slope",
            "Predicts sweeping systemic collapse from a narrow ruling",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Clarity,
            &[
                r"\bwill open the floodgates\b",
                r"\bset a dangerous precedent\b",
                r"\berode the rule of law entirely\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "LEGAL_VAGUE_PRECEDENT",
            "Vague precedent appeal",
            "Invokes unnamed precedent as self-evidently controlling",
            PitTier::Tier3,
            Severity::Moderate,
            Principle::Truth,
            &[
                r"\bcourts have long held\b",
                r"\bit is axiomatic in the law\b",
                r"\bas every court has recognized\b",
            ],
            1,
            true,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_example_scenario() {
        let patterns = patterns();
        let text = "It is well-settled law that this claim is plainly meritless.";
        let settled = patterns.iter().find(|p| p.id == "LEGAL_SETTLED_DISMISSAL").unwrap();
        let merit = patterns.iter().find(|p| p.id == "LEGAL_MERIT_DISMISSAL").unwrap();
        assert!(settled.indicators.iter().any(|r| r.is_match(text)));
        assert!(merit.indicators.iter().any(|r| r.is_match(text)));
    }
}
