use regex::Regex;

use crate::principle::Principle;
use crate::severity::Severity;
use crate::tier::PitTier;

/// An immutable structural-distortion detector.
///
/// Patterns shipped by the frozen registry are constructed once at
/// process start. Patterns promoted out of the learning ring are
/// compiled on demand from their stored regex source and shaped into
/// this same type so the evaluator cannot tell the two apart.
#[derive(Debug, Clone)]
pub struct StructuralPattern {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pit_tier: PitTier,
    pub severity: Severity,
    pub principle: Principle,
    pub indicators: Vec<Regex>,
    pub min_matches: usize,
    pub suppress_if_cited: bool,
}

impl StructuralPattern {
    /// Build a pattern from a single regex source, as used by the
    /// registry's domain catalogs. Panics on an invalid regex: a bad
    /// literal in the frozen catalog is a startup failure, never a
    /// runtime one.
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        pit_tier: PitTier,
        severity: Severity,
        principle: Principle,
        indicators: &[&str],
        min_matches: usize,
        suppress_if_cited: bool,
    ) -> Self {
        let compiled = indicators
            .iter()
            .map(|src| {
                regex::RegexBuilder::new(src)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()
                    .unwrap_or_else(|e| panic!("invalid pattern indicator in {id}: {e}"))
            })
            .collect();

        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            pit_tier,
            severity,
            principle,
            indicators: compiled,
            min_matches: min_matches.max(1),
            suppress_if_cited,
        }
    }

    /// Build a pattern from a single already-validated regex source,
    /// used when shaping a learned pattern for consumption by the
    /// evaluator. Returns `Err` if the source fails to compile.
    pub fn try_from_source(
        id: String,
        name: String,
        description: String,
        pit_tier: PitTier,
        severity: Severity,
        principle: Principle,
        regex_source: &str,
        min_matches: usize,
        suppress_if_cited: bool,
    ) -> Result<Self, regex::Error> {
        let compiled = regex::RegexBuilder::new(regex_source)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self {
            id,
            name,
            description,
            pit_tier,
            severity,
            principle,
            indicators: vec![compiled],
            min_matches: min_matches.max(1),
            suppress_if_cited,
        })
    }
}
