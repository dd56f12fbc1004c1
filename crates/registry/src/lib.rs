//! The frozen pattern registry.
//!
//! Holds the four immutable structural-pattern collections (general,
//! legal, media, financial) and the keyword-marker list. Everything here
//! is built once, at first access, and never mutated; patterns promoted
//! out of the learning ring are layered on top by the caller, never
//! merged into these collections.

pub mod citations;
pub mod financial;
pub mod general;
pub mod legal;
pub mod markers;
pub mod media;

use once_cell::sync::Lazy;
use veritas_core::{Domain, StructuralPattern, CORE_VERSION};

pub use citations::{has_nearby_citation, CITATION_REGEX, CITATION_WINDOW};
pub use markers::MARKERS;

static BASE: Lazy<Vec<StructuralPattern>> = Lazy::new(general::patterns);
static LEGAL: Lazy<Vec<StructuralPattern>> = Lazy::new(legal::patterns);
static MEDIA: Lazy<Vec<StructuralPattern>> = Lazy::new(media::patterns);
static FINANCIAL: Lazy<Vec<StructuralPattern>> = Lazy::new(financial::patterns);

/// Read-only handle onto the frozen catalog. Cheap to construct: it
/// holds no state of its own, only dispatches into the static catalogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternRegistry;

impl PatternRegistry {
    pub fn new() -> Self {
        Self
    }

    /// The version stamp carried on every `CoreEvaluation` and
    /// `ScanResult` produced against this catalog.
    pub fn core_version(&self) -> &'static str {
        CORE_VERSION
    }

    /// The base catalog, applied regardless of domain.
    pub fn base_patterns(&self) -> &'static [StructuralPattern] {
        &BASE
    }

    /// The patterns active for `domain`: base plus the domain's overlay.
    /// `Domain::Auto` is the union of base and every overlay, since the
    /// caller hasn't told us which domain the text belongs to.
    pub fn active_patterns(&self, domain: Domain) -> Vec<&'static StructuralPattern> {
        let mut active: Vec<&'static StructuralPattern> = BASE.iter().collect();
        match domain {
            Domain::General => {}
            Domain::Legal => active.extend(LEGAL.iter()),
            Domain::Media => active.extend(MEDIA.iter()),
            Domain::Financial => active.extend(FINANCIAL.iter()),
            Domain::Auto => {
                active.extend(LEGAL.iter());
                active.extend(MEDIA.iter());
                active.extend(FINANCIAL.iter());
            }
        }
        active
    }

    pub fn markers(&self) -> &'static [(&'static str, &'static str, &'static str)] {
        MARKERS
    }

    /// Principles and tier taxonomy rendered as prose, for injection
    /// into an LLM system message ahead of a deep-analysis call.
    pub fn principles_prompt(&self) -> &'static str {
        "Frozen taxonomy for rhetorical distortion analysis.\n\n\
         Principles (what a distortion violates): Truth, Justice, Clarity, Agency, Identity.\n\n\
         PIT tiers (how deep a distortion reaches):\n\
         tier 1 - ideological: worldview-level framing.\n\
         tier 2 - psychological: cognitive levers such as urgency, fear, or consensus pressure.\n\
         tier 3 - institutional: authority- or institution-based distortion.\n\n\
         Severity: low, moderate, high, critical."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_domain_excludes_overlays() {
        let registry = PatternRegistry::new();
        let active = registry.active_patterns(Domain::General);
        assert!(active.iter().all(|p| !p.id.starts_with("LEGAL_")));
        assert!(active.iter().all(|p| !p.id.starts_with("MEDIA_")));
    }

    #[test]
    fn legal_domain_includes_legal_overlay_only() {
        let registry = PatternRegistry::new();
        let active = registry.active_patterns(Domain::Legal);
        assert!(active.iter().any(|p| p.id.starts_with("LEGAL_")));
        assert!(active.iter().all(|p| !p.id.starts_with("MEDIA_")));
        assert!(active.iter().all(|p| !p.id.starts_with("FIN_")));
    }

    #[test]
    fn auto_domain_is_union_of_all_overlays() {
        let registry = PatternRegistry::new();
        let active = registry.active_patterns(Domain::Auto);
        assert!(active.iter().any(|p| p.id.starts_with("LEGAL_")));
        assert!(active.iter().any(|p| p.id.starts_with("MEDIA_")));
        assert!(active.iter().any(|p| p.id.starts_with("FIN_")));
        assert!(active.iter().any(|p| p.id.starts_with("GEN_")));
    }

    #[test]
    fn pattern_ids_are_unique_within_a_domain() {
        let registry = PatternRegistry::new();
        for domain in [
            Domain::General,
            Domain::Legal,
            Domain::Media,
            Domain::Financial,
            Domain::Auto,
        ] {
            let active = registry.active_patterns(domain);
            let mut ids: Vec<&str> = active.iter().map(|p| p.id.as_str()).collect();
            let before = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(before, ids.len(), "duplicate pattern id in {domain:?}");
        }
    }
}
