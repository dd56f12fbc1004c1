//! Domain overlay for media and journalistic text.

use veritas_core::{Principle, Severity, StructuralPattern};
use veritas_core::PitTier;

pub fn patterns() -> Vec<StructuralPattern> {
    vec![
        StructuralPattern::new(
            "MEDIA_UNNAMED_SOURCES",
            "Unnamed sourcing",
            "Attributes a claim to sources that are never identified",
            PitTier::Tier3,
            Severity::Moderate,
            Principle::Truth,
            &[
                r"\bsources say\b",
                r"\binsiders claim\b",
                r"\bpeople familiar with the matter\b",
                r"\baccording to sources close to\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "MEDIA_LOADED_LANGUAGE",
            "Loaded language",
            "Uses emotionally charged labels in place of neutral description",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Clarity,
            &[
                r"\bso-called\b",
                r"\bradical agenda\b",
                r"\bextremist agenda\b",
                r"\bshocking truth\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "MEDIA_FALSE_BALANCE",
            "False balance",
            "Presents a settled question as an even split between two camps",
            PitTier::Tier1,
            Severity::Moderate,
            Principle::Truth,
            &[r"\bsome (say|claim|argue).{0,80}others (say|claim|argue)\b"],
            1,
            false,
        ),
        StructuralPattern::new(
            "MEDIA_MANUFACTURED_OUTRAGE",
            "Manufactured outrage",
            "Asserts a groundswell of public anger without evidence of scale",
            PitTier::Tier2,
            Severity::High,
            Principle::Agency,
            &[
                r"\bthe internet is furious\b",
                r"\bbacklash is growing\b",
                r"\boutrage erupts over\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "MEDIA_CLICKBAIT_REVEAL",
            "Clickbait withholding",
            "Withholds the substance of a claim to manufacture curiosity",
            PitTier::Tier2,
            Severity::Low,
            Principle::Clarity,
            &[
                r"\byou won't believe what happened next\b",
                r"\bwhat happened next will shock you\b",
            ],
            1,
            false,
        ),
        StructuralPattern::new(
            "MEDIA_APPEAL_TO_FEAR",
            "Personalized fear appeal",
            "Frames a story as a direct threat to the reader personally",
            PitTier::Tier2,
            Severity::High,
            Principle::Agency,
            &[
                r"\bcould affect you and your family\b",
                r"\bexperts warn this could be the next\b",
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
    fn unnamed_sources_matches() {
        let patterns = patterns();
        let p = patterns.iter().find(|p| p.id == "MEDIA_UNNAMED_SOURCES").unwrap();
        assert!(p.indicators.iter().any(|r| r.is_match("Sources say the deal collapsed overnight.")));
    }
}
