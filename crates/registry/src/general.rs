//! The base catalog, applied regardless of domain.

use veritas_core::{Principle, Severity, StructuralPattern};
use veritas_core::PitTier;

pub fn patterns() -> Vec<StructuralPattern> {
    vec![
        StructuralPattern::new(
            "GEN_CONSENSUS_APPEAL",
            "Unearned consensus appeal",
            "Asserts universal agreement without naming who agrees or why",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Truth,
            &[
                r"\beveryone (agrees|knows)\b",
                r"\bno one disputes\b",
                r"\bit is widely accepted\b",
                r"\bit is settled\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_FEAR_URGENCY",
            "Fear-driven urgency",
            "Pressures immediate action by invoking unspecified catastrophe",
            PitTier::Tier2,
            Severity::High,
            Principle::Agency,
            &[
                r"\bif we (do not|don't) act now\b",
                r"\bbefore it('s| is) too late\b",
                r"\bcatastrophic consequences\b",
                r"\bconsequences will be catastrophic\b",
                r"\btime is running out\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_FALSE_DICHOTOMY",
            "False dichotomy",
            "Presents exactly two options where more plainly exist",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Clarity,
            &[
                r"\beither you are with us or against us\b",
                r"\bthere is no middle ground\b",
                r"\byou're either for this or you're against it\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_AD_HOMINEM",
            "Character attack in place of argument",
            "Dismisses a position by attacking the people who hold it",
            PitTier::Tier2,
            Severity::Moderate,
            Principle::Justice,
            &[
                r"\bonly an idiot would believe\b",
                r"\banyone who disagrees is\b",
                r"\bno rational person could possibly\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_STRAWMAN",
            "Strawman restatement",
            "Restates an opposing position in a weaker, easier-to-attack form",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Clarity,
            &[
                r"\bso you're saying that\b",
                r"\bwhat they really mean is\b",
                r"\bthis is just another way of saying\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_BANDWAGON",
            "Bandwagon appeal",
            "Urges adoption on the basis of popularity alone",
            PitTier::Tier1,
            Severity::Low,
            Principle::Identity,
            &[
                r"\bjoin the millions who\b",
                r"\beveryone is doing it\b",
                r"\bdon't be left behind\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_SLIPPERY_SLOPE",
            "Slippery slope",
            "Asserts an inevitable extreme outcome from a modest premise",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Clarity,
            &[
                r"\bthis will inevitably lead to\b",
                r"\bit's a slippery slope to\b",
                r"\bnext thing you know\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "GEN_APPEAL_TO_TRADITION",
            "Appeal to tradition",
            "Justifies a claim solely by its longevity",
            PitTier::Tier1,
            Severity::Low,
            Principle::Identity,
            &[
                r"\bit has always been this way\b",
                r"\bthis is how it's always been done\b",
                r"\bour ancestors knew best\b",
            ],
            1,
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consensus_pattern_matches_example() {
        let patterns = patterns();
        let p = patterns.iter().find(|p| p.id == "GEN_CONSENSUS_APPEAL").unwrap();
        assert!(p.indicators.iter().any(|r| r.is_match("Everyone agrees this is settled.")));
    }

    #[test]
    fn fear_urgency_matches_example() {
        let patterns = patterns();
        let p = patterns.iter().find(|p| p.id == "GEN_FEAR_URGENCY").unwrap();
        assert!(p
            .indicators
            .iter()
            .any(|r| r.is_match("If we do not act now, the consequences will be catastrophic.")));
    }
}
