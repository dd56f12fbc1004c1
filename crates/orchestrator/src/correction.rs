//! The corrector: threshold-gated iterative LLM rewrite with
//! per-iteration frozen-core verification and a deterministic,
//! LLM-independent diff.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use veritas_core::{Domain, Flag, Severity};
use veritas_detect::evaluate;
use veritas_llm::{GenerateRequest, LlmError, LlmProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSpan {
    #[serde(rename = "type")]
    pub op: DiffOp,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corr_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corr_end: Option<usize>,
}

/// A deterministic, LLM-independent character-level diff between
/// `original` and `corrected`. Consecutive same-tag characters are
/// merged into one span.
pub fn compute_diff_spans(original: &str, corrected: &str) -> Vec<DiffSpan> {
    let diff = TextDiff::from_chars(original, corrected);
    let mut spans: Vec<DiffSpan> = Vec::new();

    for change in diff.iter_all_changes() {
        let tag = match change.tag() {
            ChangeTag::Equal => DiffOp::Equal,
            ChangeTag::Delete => DiffOp::Delete,
            ChangeTag::Insert => DiffOp::Insert,
        };
        let ch = change.value();
        let old_idx = change.old_index();
        let new_idx = change.new_index();

        if let Some(last) = spans.last_mut() {
            if last.op == tag && last.orig_end == old_idx && last.corr_end == new_idx {
                last.text.push_str(ch);
                last.orig_end = old_idx.map(|i| i + 1);
                last.corr_end = new_idx.map(|i| i + 1);
                continue;
            }
        }

        spans.push(DiffSpan {
            op: tag,
            text: ch.to_string(),
            orig_start: old_idx,
            orig_end: old_idx.map(|i| i + 1),
            corr_start: new_idx,
            corr_end: new_idx.map(|i| i + 1),
        });
    }

    spans
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationTrace {
    pub iteration: u32,
    pub truth_score_before: i32,
    pub truth_score_after: i32,
    pub flags_remaining: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub correction_triggered: bool,
    pub corrected: String,
    pub changes_made: Vec<String>,
    pub bias_removed: Vec<String>,
    pub iterations: Vec<IterationTrace>,
    pub converged: bool,
    pub diff_spans: Vec<DiffSpan>,
    pub confidence: f64,
    pub error: Option<String>,
}

impl CorrectionResult {
    fn identity(original: &str) -> Self {
        Self {
            correction_triggered: false,
            corrected: original.to_string(),
            changes_made: Vec::new(),
            bias_removed: Vec::new(),
            iterations: Vec::new(),
            converged: true,
            diff_spans: Vec::new(),
            confidence: 1.0,
            error: None,
        }
    }

    fn failed(original: &str, error: String) -> Self {
        Self {
            correction_triggered: true,
            corrected: original.to_string(),
            changes_made: Vec::new(),
            bias_removed: Vec::new(),
            iterations: Vec::new(),
            converged: false,
            diff_spans: Vec::new(),
            confidence: 0.0,
            error: Some(error),
        }
    }
}

/// Whether the truth score and flag mix are bad enough to trigger a
/// correction pass: markers alone never trigger it.
pub fn should_correct(truth_score: i32, flags: &[Flag]) -> bool {
    if truth_score <= 80 {
        return true;
    }
    flags
        .iter()
        .any(|f| f.is_structural() && f.severity >= Severity::Moderate)
}

#[derive(Deserialize)]
struct RawCorrectionResponse {
    corrected: String,
    #[serde(default)]
    changes_made: Vec<String>,
    #[serde(default)]
    bias_removed: Vec<String>,
}

fn build_instructions(flags: &[Flag]) -> String {
    flags
        .iter()
        .map(|f| format!("- [{}] {} (matched: \"{}\"): {}", f.severity, f.pattern_id, f.matched_text, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(text: &str, flags: &[Flag], iteration: u32) -> String {
    let instructions = build_instructions(flags);
    if iteration == 0 {
        format!(
            "Rewrite the following text to remove the rhetorical distortions listed below, preserving its \
             factual content and meaning as closely as possible. Respond with a single JSON object: \
             {{corrected, changes_made: [string], bias_removed: [string]}}.\n\nFlags to address:\n{instructions}\n\nTEXT:\n{text}"
        )
    } else {
        format!(
            "The previous rewrite still exhibits these flags. Refine it further, addressing only what remains, \
             without reintroducing prior issues. Respond with a single JSON object: \
             {{corrected, changes_made: [string], bias_removed: [string]}}.\n\nSurviving flags:\n{instructions}\n\nTEXT:\n{text}"
        )
    }
}

async fn call_llm_for_correction(
    provider: &dyn LlmProvider,
    text: &str,
    flags: &[Flag],
    iteration: u32,
) -> Result<RawCorrectionResponse, LlmError> {
    let prompt = build_prompt(text, flags, iteration);
    let request = GenerateRequest::new(prompt, 0.2).json();
    let raw = provider.generate_json(request).await?;
    serde_json::from_value(raw).map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

/// Runs the iterative correction loop: up to `max_iterations` rewrite
/// + verify passes, exiting as soon as the verification condition is
/// met. Driven from the pieces a prior `ScanResult` already carries,
/// so a caller never needs to re-run the evaluator just to reconstruct
/// a `CoreEvaluation`.
pub async fn correct(
    provider: &dyn LlmProvider,
    original_text: &str,
    domain: Domain,
    all_flags: &[Flag],
    original_structural_count: usize,
    initial_truth_score: i32,
    max_iterations: u32,
) -> CorrectionResult {
    if !should_correct(initial_truth_score, all_flags) {
        return CorrectionResult::identity(original_text);
    }

    let mut current_text = original_text.to_string();
    let mut current_flags = all_flags.to_vec();
    let mut truth_score_before = initial_truth_score;
    let mut iterations = Vec::new();
    let mut last_response: Option<RawCorrectionResponse> = None;
    let mut converged = false;

    for iteration in 0..max_iterations {
        let response = match call_llm_for_correction(provider, &current_text, &current_flags, iteration).await {
            Ok(r) => r,
            Err(e) => return CorrectionResult::failed(original_text, e.to_string()),
        };

        let candidate = response.corrected.clone();
        let verification = evaluate(&candidate, domain, &[]);
        let truth_score_after = veritas_detect::score(&verification, None, &[]).0;
        let flags_remaining = verification.structural_count();

        let passed = truth_score_after >= truth_score_before && flags_remaining <= original_structural_count;

        iterations.push(IterationTrace {
            iteration: iteration + 1,
            truth_score_before,
            truth_score_after,
            flags_remaining,
            passed,
        });

        current_text = candidate;
        current_flags = verification.flags.clone();
        truth_score_before = truth_score_after;
        last_response = Some(response);

        if passed {
            converged = true;
            break;
        }
    }

    let diff_spans = compute_diff_spans(original_text, &current_text);
    let (changes_made, bias_removed) = last_response
        .map(|r| (r.changes_made, r.bias_removed))
        .unwrap_or_default();

    CorrectionResult {
        correction_triggered: true,
        corrected: current_text,
        changes_made,
        bias_removed,
        iterations,
        converged,
        diff_spans,
        confidence: if converged { 0.9 } else { 0.5 },
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_produce_a_single_equal_span() {
        let spans = compute_diff_spans("hello", "hello");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].op, DiffOp::Equal);
        assert_eq!(spans[0].text, "hello");
    }

    #[test]
    fn insertion_is_isolated_from_surrounding_equal_spans() {
        let spans = compute_diff_spans("ac", "abc");
        let ops: Vec<DiffOp> = spans.iter().map(|s| s.op).collect();
        assert_eq!(ops, vec![DiffOp::Equal, DiffOp::Insert, DiffOp::Equal]);
        assert_eq!(spans[1].text, "b");
    }

    #[test]
    fn deletion_is_isolated_from_surrounding_equal_spans() {
        let spans = compute_diff_spans("abc", "ac");
        let ops: Vec<DiffOp> = spans.iter().map(|s| s.op).collect();
        assert_eq!(ops, vec![DiffOp::Equal, DiffOp::Delete, DiffOp::Equal]);
        assert_eq!(spans[1].text, "b");
    }

    #[test]
    fn markers_alone_never_trigger_correction() {
        let marker = Flag::marker("MARK_STUDIES_SHOW", "studies show", "desc");
        assert!(!should_correct(95, &[marker]));
    }

    #[test]
    fn low_truth_score_triggers_correction_regardless_of_flags() {
        assert!(should_correct(75, &[]));
    }

    #[test]
    fn moderate_or_worse_structural_flag_triggers_correction() {
        let flag = Flag::structural(
            "GEN_FEAR_URGENCY",
            "act now",
            veritas_core::PitTier::Tier2,
            Severity::Moderate,
            "desc",
            veritas_core::Principle::Agency,
        );
        assert!(should_correct(95, &[flag]));
    }
}
