//! Deep-analysis: one LLM call that looks for distortion the frozen
//! regex catalog cannot see, shaped into the same flag vocabulary the
//! evaluator uses.

use serde::Deserialize;
use serde_json::Value;
use veritas_core::{Domain, Flag, KnowledgeType, PitTier, Principle, Severity};
use veritas_llm::{GenerateRequest, LlmError, LlmProvider};
use veritas_registry::PatternRegistry;

/// The LLM's raw deep-analysis verdict, normalized into engine types.
#[derive(Debug, Clone, Default)]
pub struct DeepAnalysis {
    pub bias_detected: bool,
    pub severity: Option<Severity>,
    pub bias_types: Vec<String>,
    pub knowledge_type: Option<KnowledgeType>,
    pub pit_tier: Option<PitTier>,
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Deserialize)]
struct RawDeepResponse {
    #[serde(default)]
    bias_detected: bool,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    bias_types: Vec<String>,
    #[serde(default)]
    knowledge_type: Option<String>,
    #[serde(default)]
    pit_tier: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    flags: Vec<RawDeepFlag>,
}

#[derive(Debug, Deserialize)]
struct RawDeepFlag {
    #[serde(default)]
    pattern_id: Option<String>,
    #[serde(default)]
    matched_text: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    pit_tier: Option<u8>,
    #[serde(default)]
    description: Option<String>,
}

fn build_prompt(registry: &PatternRegistry, domain: Domain, text: &str, already_detected: &[String]) -> String {
    let overlay_note = match domain {
        Domain::General => "General-purpose editorial review.".to_string(),
        other => format!("Domain-specific review for the {other} domain."),
    };
    let suppressed = if already_detected.is_empty() {
        "none".to_string()
    } else {
        already_detected.join(", ")
    };
    format!(
        "{}\n\n{}\n\nAlready detected by the local pattern scan (do not repeat these pattern ids): {}\n\n\
         Analyze the following text for rhetorical bias and structural distortion not already caught above. \
         Respond with a single JSON object with keys: bias_detected (bool), severity (one of none/low/moderate/high/critical), \
         bias_types (array of short labels, or [\"none\"]), knowledge_type (one of neutral/mixed/sense/revelation), \
         pit_tier (one of \"1\"/\"2\"/\"3\"), confidence (0 to 1), explanation (string), \
         flags (array of objects with pattern_id, matched_text, severity, pit_tier, description).\n\nTEXT:\n{}",
        registry.principles_prompt(),
        overlay_note,
        suppressed,
        text,
    )
}

/// Runs one deep-analysis call and normalizes the response. AI flags
/// whose `pattern_id` collides (case-insensitively) with `local_flag_ids`
/// are dropped as duplicates.
pub async fn run_deep_analysis(
    provider: &dyn LlmProvider,
    registry: &PatternRegistry,
    domain: Domain,
    text: &str,
    local_flag_ids: &[String],
) -> Result<DeepAnalysis, LlmError> {
    let prompt = build_prompt(registry, domain, text, local_flag_ids);
    let request = GenerateRequest::new(prompt, 0.2).json();
    let raw = provider.generate_json(request).await?;
    Ok(parse_deep_response(raw, local_flag_ids))
}

fn parse_deep_response(raw: Value, local_flag_ids: &[String]) -> DeepAnalysis {
    let parsed: RawDeepResponse = match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(_) => return DeepAnalysis::default(),
    };

    let seen_local: Vec<String> = local_flag_ids.iter().map(|id| id.to_lowercase()).collect();
    let mut flags = Vec::new();
    for raw_flag in parsed.flags {
        let (pattern_id, matched_text) = match (raw_flag.pattern_id, raw_flag.matched_text) {
            (Some(id), Some(text)) if !id.trim().is_empty() && !text.trim().is_empty() => (id, text),
            _ => continue,
        };
        if seen_local.contains(&pattern_id.to_lowercase()) {
            continue;
        }
        let severity = raw_flag
            .severity
            .as_deref()
            .and_then(Severity::parse)
            .unwrap_or(Severity::Moderate);
        let pit_tier = raw_flag.pit_tier.and_then(PitTier::from_u8).unwrap_or(PitTier::Tier2);
        let description = raw_flag.description.unwrap_or_else(|| "deep-analysis flag".to_string());
        let mut flag = Flag::structural(pattern_id, &matched_text, pit_tier, severity, description, Principle::Truth);
        flag.source = Some(veritas_core::FlagSource::Ai);
        flags.push(flag);
    }

    DeepAnalysis {
        bias_detected: parsed.bias_detected,
        severity: parsed.severity.as_deref().and_then(Severity::parse),
        bias_types: parsed.bias_types,
        knowledge_type: parsed.knowledge_type.as_deref().and_then(KnowledgeType::parse),
        pit_tier: parsed
            .pit_tier
            .as_deref()
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(PitTier::from_u8),
        confidence: parsed.confidence,
        explanation: parsed.explanation,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_pattern_ids_are_dropped_case_insensitively() {
        let raw = json!({
            "bias_detected": true,
            "severity": "high",
            "bias_types": ["fear"],
            "flags": [
                {"pattern_id": "GEN_FEAR_URGENCY", "matched_text": "act now"},
                {"pattern_id": "NEW_PATTERN", "matched_text": "trust me"},
            ],
        });
        let analysis = parse_deep_response(raw, &["gen_fear_urgency".to_string()]);
        assert_eq!(analysis.flags.len(), 1);
        assert_eq!(analysis.flags[0].pattern_id, "NEW_PATTERN");
    }

    #[test]
    fn malformed_json_yields_empty_analysis() {
        let analysis = parse_deep_response(json!("not an object"), &[]);
        assert!(!analysis.bias_detected);
        assert!(analysis.flags.is_empty());
    }

    #[test]
    fn flag_missing_required_fields_is_skipped() {
        let raw = json!({"flags": [{"pattern_id": "X"}]});
        let analysis = parse_deep_response(raw, &[]);
        assert!(analysis.flags.is_empty());
    }
}
