//! The evaluator: a pure function of text, domain, and the active
//! pattern set.

use veritas_core::{CoreEvaluation, Domain, Flag, KnowledgeType, PitTier, Principle, StructuralPattern};
use veritas_registry::{has_nearby_citation, PatternRegistry, MARKERS};

/// Run the evaluator over `text`. `external_patterns` are active learned
/// patterns from the learning ring; pass an empty slice when none are
/// active or the caller doesn't have learning-ring access.
pub fn evaluate(text: &str, domain: Domain, external_patterns: &[StructuralPattern]) -> CoreEvaluation {
    let registry = PatternRegistry::new();
    let mut active: Vec<&StructuralPattern> = registry.active_patterns(domain);
    active.extend(external_patterns.iter());

    let mut flags: Vec<Flag> = Vec::new();

    for pattern in &active {
        let mut matches: Vec<(usize, usize)> = Vec::new();
        for indicator in &pattern.indicators {
            for m in indicator.find_iter(text) {
                matches.push((m.start(), m.end()));
            }
        }
        if matches.len() < pattern.min_matches {
            continue;
        }
        matches.sort_by_key(|(start, _)| *start);

        if pattern.suppress_if_cited {
            let all_cited = matches
                .iter()
                .all(|(start, end)| has_nearby_citation(text, *start, *end));
            if all_cited {
                continue;
            }
        }

        let (first_start, first_end) = matches[0];
        flags.push(Flag::structural(
            pattern.id.clone(),
            &text[first_start..first_end],
            pattern.pit_tier,
            pattern.severity,
            pattern.description.clone(),
            pattern.principle,
        ));
    }

    for &(id, literal, description) in MARKERS {
        if let Some((start, end)) = find_case_insensitive(text, literal) {
            if !has_nearby_citation(text, start, end) {
                flags.push(Flag::marker(id, &text[start..end], description));
            }
        }
    }

    let structural_count = flags.iter().filter(|f| f.is_structural()).count();
    let marker_count = flags.len() - structural_count;

    let knowledge_type = classify_knowledge_type(structural_count, marker_count);
    let aligned = matches!(knowledge_type, KnowledgeType::Neutral | KnowledgeType::Mixed)
        || structural_count + marker_count == 0;

    let pit_tier_active = dominant_tier(&flags).map(|t| t.label());
    let primary_principle = primary_principle(&flags);
    let confidence = confidence(text, structural_count, marker_count, &flags);
    let summary = summarize(structural_count, marker_count, pit_tier_active.as_deref());

    CoreEvaluation {
        aligned,
        knowledge_type,
        confidence,
        flags,
        primary_principle,
        pit_tier_active,
        summary,
        core_version: registry.core_version().to_string(),
    }
}

/// Case-insensitive substring search that returns byte offsets into the
/// original `text`, not into a lowercased copy of it: lowercasing can
/// change a character's byte length (e.g. `İ` U+0130 is 2 bytes but its
/// lowercase `i̇` is 3), which would otherwise shift every offset after
/// the first such character and risk slicing `text` off a char boundary.
fn find_case_insensitive(text: &str, literal: &str) -> Option<(usize, usize)> {
    let literal_chars: Vec<char> = literal.chars().collect();
    if literal_chars.is_empty() {
        return None;
    }
    let text_chars: Vec<(usize, char)> = text.char_indices().collect();
    for start in 0..text_chars.len() {
        if start + literal_chars.len() > text_chars.len() {
            break;
        }
        let is_match = literal_chars
            .iter()
            .enumerate()
            .all(|(i, lit_char)| text_chars[start + i].1.to_lowercase().eq(lit_char.to_lowercase()));
        if is_match {
            let start_byte = text_chars[start].0;
            let end_byte = text_chars.get(start + literal_chars.len()).map(|(b, _)| *b).unwrap_or(text.len());
            return Some((start_byte, end_byte));
        }
    }
    None
}

fn classify_knowledge_type(structural_count: usize, marker_count: usize) -> KnowledgeType {
    let total = structural_count + marker_count;
    if structural_count >= 2 || total >= 4 {
        KnowledgeType::Sense
    } else if total >= 1 {
        KnowledgeType::Mixed
    } else {
        KnowledgeType::Neutral
    }
}

fn dominant_tier(flags: &[Flag]) -> Option<PitTier> {
    if flags.is_empty() {
        return None;
    }
    let mut weights = [0i32; 3];
    for flag in flags {
        let weight = if flag.is_structural() { 3 } else { 1 };
        weights[(flag.pit_tier.as_u8() - 1) as usize] += weight;
    }
    weights
        .iter()
        .enumerate()
        .max_by_key(|(idx, w)| (**w, std::cmp::Reverse(*idx)))
        .and_then(|(idx, w)| if *w > 0 { PitTier::from_u8((idx + 1) as u8) } else { None })
}

fn primary_principle(flags: &[Flag]) -> Principle {
    let structural_principles: Vec<Principle> =
        flags.iter().filter(|f| f.is_structural()).filter_map(|f| f.principle).collect();
    if structural_principles.is_empty() {
        return Principle::default();
    }
    let mut counts = [0u32; 5];
    for p in &structural_principles {
        let idx = Principle::ALL.iter().position(|candidate| candidate == p).unwrap();
        counts[idx] += 1;
    }
    let (idx, _) = counts
        .iter()
        .enumerate()
        .max_by_key(|(idx, count)| (**count, std::cmp::Reverse(*idx)))
        .unwrap();
    Principle::ALL[idx]
}

fn confidence(text: &str, structural_count: usize, marker_count: usize, flags: &[Flag]) -> f64 {
    if structural_count + marker_count == 0 {
        return if text.chars().count() > 100 { 0.9 } else { 0.6 };
    }
    let unique_tiers = flags
        .iter()
        .map(|f| f.pit_tier.as_u8())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let raw = 0.5
        + 0.12 * structural_count.min(3) as f64
        + 0.03 * marker_count.min(3) as f64
        + 0.05 * unique_tiers.min(2) as f64;
    raw.min(0.95)
}

fn summarize(structural_count: usize, marker_count: usize, dominant_tier: Option<&str>) -> String {
    if structural_count + marker_count == 0 {
        return "No structural distortion or keyword markers detected.".to_string();
    }
    match dominant_tier {
        Some(tier) => format!(
            "Detected {structural_count} structural flag(s) and {marker_count} marker(s); dominant tier {tier}."
        ),
        None => format!("Detected {structural_count} structural flag(s) and {marker_count} marker(s)."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_1_neutral_factual_sentence() {
        let eval = evaluate("The meeting is scheduled for 3pm Tuesday.", Domain::General, &[]);
        assert!(eval.flags.is_empty());
        assert_eq!(eval.knowledge_type, KnowledgeType::Neutral);
        assert!(eval.aligned);
    }

    #[test]
    fn scenario_2_marker_suppressed_by_citation() {
        let eval = evaluate(
            "Studies show (Smith et al., 2024) that sleep improves cognition.",
            Domain::General,
            &[],
        );
        assert!(eval.flags.is_empty());
    }

    #[test]
    fn scenario_3_marker_fires_without_citation() {
        let eval = evaluate("Studies show that sleep improves cognition.", Domain::General, &[]);
        assert!(eval.flags.iter().any(|f| f.pattern_id == "MARK_STUDIES_SHOW"));
    }

    #[test]
    fn scenario_4_legal_structural_flags() {
        let eval = evaluate(
            "It is well-settled law that this claim is plainly meritless.",
            Domain::Legal,
            &[],
        );
        let ids: Vec<&str> = eval.flags.iter().map(|f| f.pattern_id.as_str()).collect();
        assert!(ids.contains(&"LEGAL_SETTLED_DISMISSAL"));
        assert!(ids.contains(&"LEGAL_MERIT_DISMISSAL"));
    }

    #[test]
    fn scenario_5_multi_tier_general_flags() {
        let eval = evaluate(
            "Everyone agrees this is settled. If we do not act now, the consequences will be catastrophic.",
            Domain::General,
            &[],
        );
        let ids: Vec<&str> = eval.flags.iter().map(|f| f.pattern_id.as_str()).collect();
        assert!(ids.contains(&"GEN_CONSENSUS_APPEAL"));
        assert!(ids.contains(&"GEN_FEAR_URGENCY"));
        let tiers: std::collections::BTreeSet<_> = eval
            .flags
            .iter()
            .filter(|f| f.is_structural())
            .map(|f| f.pit_tier)
            .collect();
        assert!(tiers.len() >= 2);
    }

    #[test]
    fn no_flags_implies_clean_summary_and_high_confidence() {
        let long_text = "a".repeat(150);
        let eval = evaluate(&long_text, Domain::General, &[]);
        assert!(eval.flags.is_empty());
        assert_eq!(eval.confidence, 0.9);
    }

    #[test]
    fn confidence_never_exceeds_point_nine_five() {
        let eval = evaluate(
            "Everyone agrees this is settled. If we do not act now, the consequences will be catastrophic. Studies show experts agree everyone knows this is common sense dictates truth without a doubt undeniably.",
            Domain::General,
            &[],
        );
        assert!(eval.confidence <= 0.95);
    }

    #[test]
    fn marker_after_a_multi_byte_lowercase_expansion_does_not_panic() {
        let text = "\u{0130} reports indicate this is true.";
        let eval = evaluate(text, Domain::General, &[]);
        assert!(eval.flags.iter().any(|f| f.pattern_id == "MARK_REPORTS_INDICATE"));
    }
}
