//! The pattern proposer: extracts a candidate structural pattern from
//! a deep-analysis result, validates it, and hands it to the learning
//! ring. Never runs against local-only scans.

use serde::Deserialize;
use veritas_core::{PitTier, Principle, Severity};
use veritas_llm::{GenerateRequest, LlmProvider};
use veritas_registry::PatternRegistry;

use crate::deep::DeepAnalysis;

const COMMON_WORDS: [&str; 6] = ["the", "is", "a", "and", "to", "in"];

#[derive(Debug, Deserialize)]
struct RawProposal {
    pattern_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    pit_tier: Option<u8>,
    severity: Option<String>,
    principle: Option<String>,
    regex: Option<String>,
}

pub struct ValidatedProposal {
    pub pattern_id: String,
    pub name: String,
    pub description: String,
    pub pit_tier: PitTier,
    pub severity: Severity,
    pub principle: Principle,
    pub regex: String,
}

/// True if the deep-analysis result gives the proposer nothing worth
/// extracting.
pub fn should_skip(deep: &DeepAnalysis, local_flag_count: usize) -> bool {
    if !deep.bias_detected {
        return true;
    }
    if matches!(deep.severity, Some(Severity::Low) | None) {
        return true;
    }
    if local_flag_count >= 3 {
        return true;
    }
    let has_novel_bias_type = deep.bias_types.iter().any(|t| t != "none");
    if !has_novel_bias_type {
        return true;
    }
    deep.pit_tier.is_none()
}

fn sanitize_base_id(name: &str) -> String {
    let sanitized: String = name
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "PATTERN".to_string()
    } else {
        trimmed.to_string()
    }
}

fn deterministic_id(name: &str, regex: &str) -> String {
    let digest = md5::compute(regex.as_bytes());
    let hex = format!("{digest:x}");
    format!("L_{}_{}", sanitize_base_id(name), &hex[..6])
}

fn matches_too_many_common_words(regex: &regex::Regex) -> bool {
    COMMON_WORDS.iter().filter(|w| regex.is_match(w)).count() >= 3
}

fn validate(raw: RawProposal) -> Option<ValidatedProposal> {
    let regex_source = raw.regex?;
    if regex_source.is_empty() || regex_source.chars().count() < 5 || regex_source.chars().count() > 1000 {
        return None;
    }
    let compiled = regex::RegexBuilder::new(&regex_source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()?;
    if compiled.is_match("") {
        return None;
    }
    if matches_too_many_common_words(&compiled) {
        return None;
    }

    let pit_tier = raw.pit_tier.and_then(PitTier::from_u8)?;
    let severity = raw.severity.as_deref().and_then(Severity::parse).unwrap_or_default();
    let principle = raw.principle.as_deref().and_then(Principle::parse).unwrap_or_default();
    let name = raw.name.unwrap_or_else(|| "proposed pattern".to_string());
    let description = raw.description.unwrap_or_else(|| "proposed by deep analysis".to_string());
    let pattern_id = deterministic_id(&name, &regex_source);

    Some(ValidatedProposal { pattern_id, name, description, pit_tier, severity, principle, regex: regex_source })
}

fn build_prompt(registry: &PatternRegistry, text: &str, deep: &DeepAnalysis) -> String {
    format!(
        "{}\n\nThe following text was judged to contain a rhetorical distortion not covered by the existing catalog. \
         Propose exactly one new structural pattern that would catch it. \
         Respond with a single JSON object: {{pattern_id, name, description, pit_tier (1/2/3), severity, principle, regex}} \
         or, if no reusable pattern applies, {{pattern_id: null, reason}}.\n\n\
         Bias types observed: {}\nExplanation: {}\n\nTEXT:\n{}",
        registry.principles_prompt(),
        deep.bias_types.join(", "),
        deep.explanation.as_deref().unwrap_or(""),
        text,
    )
}

/// Calls the LLM for a candidate pattern and validates it. Returns
/// `None` when the deep result doesn't warrant a proposal, the LLM
/// declined, or validation rejected the candidate.
pub async fn propose_pattern(
    provider: &dyn LlmProvider,
    registry: &PatternRegistry,
    text: &str,
    deep: &DeepAnalysis,
    local_flag_count: usize,
) -> Option<ValidatedProposal> {
    if should_skip(deep, local_flag_count) {
        return None;
    }
    let prompt = build_prompt(registry, text, deep);
    let request = GenerateRequest::new(prompt, 0.2).json();
    let raw = provider.generate_json(request).await.ok()?;
    let raw_proposal: RawProposal = serde_json::from_value(raw).ok()?;
    validate(raw_proposal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deep_with(severity: Severity, bias_types: Vec<&str>, pit_tier: Option<PitTier>) -> DeepAnalysis {
        DeepAnalysis {
            bias_detected: true,
            severity: Some(severity),
            bias_types: bias_types.into_iter().map(String::from).collect(),
            pit_tier,
            ..Default::default()
        }
    }

    #[test]
    fn skips_when_bias_not_detected() {
        let deep = DeepAnalysis { bias_detected: false, ..Default::default() };
        assert!(should_skip(&deep, 0));
    }

    #[test]
    fn skips_when_severity_low() {
        let deep = deep_with(Severity::Low, vec!["fear"], Some(PitTier::Tier2));
        assert!(should_skip(&deep, 0));
    }

    #[test]
    fn skips_when_local_already_found_three_flags() {
        let deep = deep_with(Severity::High, vec!["fear"], Some(PitTier::Tier2));
        assert!(should_skip(&deep, 3));
    }

    #[test]
    fn skips_when_no_novel_bias_type() {
        let deep = deep_with(Severity::High, vec!["none"], Some(PitTier::Tier2));
        assert!(should_skip(&deep, 0));
    }

    #[test]
    fn skips_when_tier_missing() {
        let deep = deep_with(Severity::High, vec!["fear"], None);
        assert!(should_skip(&deep, 0));
    }

    #[test]
    fn proceeds_when_all_conditions_met() {
        let deep = deep_with(Severity::High, vec!["fear"], Some(PitTier::Tier2));
        assert!(!should_skip(&deep, 1));
    }

    #[test]
    fn rejects_regex_matching_empty_string() {
        let raw = RawProposal {
            pattern_id: None,
            name: Some("foo".to_string()),
            description: None,
            pit_tier: Some(2),
            severity: Some("high".to_string()),
            principle: Some("Truth".to_string()),
            regex: Some("a*".to_string()),
        };
        assert!(validate(raw).is_none());
    }

    #[test]
    fn rejects_regex_with_too_many_common_words() {
        let raw = RawProposal {
            pattern_id: None,
            name: Some("foo".to_string()),
            description: None,
            pit_tier: Some(2),
            severity: Some("high".to_string()),
            principle: Some("Truth".to_string()),
            regex: Some("the|is|a".to_string()),
        };
        assert!(validate(raw).is_none());
    }

    #[test]
    fn accepts_valid_candidate_and_generates_stable_id() {
        let raw = RawProposal {
            pattern_id: None,
            name: Some("suspicious urgency".to_string()),
            description: Some("desc".to_string()),
            pit_tier: Some(2),
            severity: Some("high".to_string()),
            principle: Some("Agency".to_string()),
            regex: Some(r"\bact before it's too late\b".to_string()),
        };
        let validated = validate(raw).unwrap();
        assert!(validated.pattern_id.starts_with("L_SUSPICIOUS_URGENCY_"));

        let digest = md5::compute(r"\bact before it's too late\b".as_bytes());
        let expected_suffix = format!("{digest:x}")[..6].to_string();
        assert!(validated.pattern_id.ends_with(&expected_suffix));
    }
}
