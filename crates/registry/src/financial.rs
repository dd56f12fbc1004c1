//! Domain overlay for financial and investment text.

use veritas_core::{Principle, Severity, StructuralPattern};
use veritas_core::PitTier;

pub fn patterns() -> Vec<StructuralPattern> {
    vec![
        StructuralPattern::new(
            "FIN_GUARANTEED_RETURNS",
            "Guaranteed-returns claim",
            "Promises investment returns without the risk every investment carries",
            PitTier::Tier3,
            Severity::Critical,
            Principle::Truth,
            &[
                r"\bguaranteed returns\b",
                r"\brisk-free investment\b",
                r"\bcan't lose\b",
                r"\bguaranteed profit\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "FIN_URGENCY_SCARCITY",
            "Manufactured scarcity",
            "Pressures a decision with an artificial deadline or limited supply",
            PitTier::Tier2,
            Severity::High,
            Principle::Agency,
            &[
                r"\blimited time offer\b",
                r"\bact now before it's too late\b",
                r"\bonly a few spots left\b",
                r"\bthis opportunity won't last\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "FIN_VAGUE_CREDENTIALS",
            "Vague expert credentialing",
            "Invokes unnamed proprietary methods or unnamed experts as authority",
            PitTier::Tier3,
            Severity::Moderate,
            Principle::Truth,
            &[
                r"\bour proprietary algorithm\b",
                r"\bour team of experts has determined\b",
                r"\bindustry insiders know\b",
            ],
            1,
            true,
        ),
        StructuralPattern::new(
            "FIN_SURVIVORSHIP_CHERRYPICK",
            "Survivorship cherry-picking",
            "Projects past results forward as if failure were never possible",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Truth,
            &[
                r"\bpast performance guarantees\b",
                r"\bthis strategy has never failed\b",
                r"\balways outperforms the market\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "FIN_REGULATORY_EVASION",
            "Regulatory evasion framing",
            "Frames noncompliance with financial regulation as a benefit",
            PitTier::Tier3,
            Severity::High,
            Principle::Justice,
            &[
                r"\bnot officially registered but\b",
                r"\bregulatory technicality\b",
                r"\bloophole that protects you from\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "FIN_FOMO_PRESSURE",
            "Fear of missing out",
            "Pressures participation by invoking the crowd rather than merit",
            PitTier::Tier2,
            Severity::Moderate,
            Principle::Agency,
            &[
                r"\beveryone is already investing\b",
                r"\bdon't miss out on this\b",
                r"\bjoin thousands of investors\b",
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
    fn guaranteed_returns_matches() {
        let patterns = patterns();
        let p = patterns.iter().find(|p| p.id == "FIN_GUARANTEED_RETURNS").unwrap();
        assert!(p.indicators.iter().any(|r| r.is_match("This fund offers guaranteed returns.")));
    }
}
