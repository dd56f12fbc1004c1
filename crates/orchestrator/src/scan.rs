//! Detector orchestrator: coordinates the three scan modes, merges
//! core and LLM flags, and drives impact projection and pattern
//! proposal.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};
use veritas_audit::AuditChain;
use veritas_core::{Domain, Flag, ScanMode, ScanResult, StructuralPattern};
use veritas_detect::{evaluate, score};
use veritas_learning::LearningRing;
use veritas_llm::{GenerateRequest, LlmProvider, SharedProvider};
use veritas_registry::PatternRegistry;

use crate::correction::{self, CorrectionResult};
use crate::deep::{run_deep_analysis, DeepAnalysis};
use crate::error::OrchestratorError;
use crate::merge::merge;
use crate::proposer::propose_pattern;

const MAX_TEXT_LEN: usize = 50_000;
const MAX_BATCH_LEN: usize = 100;
const DEGRADED_SCORE_CAP: i32 = 85;
const IMPACT_PROJECTION_THRESHOLD: i32 = 80;

pub struct Orchestrator {
    registry: PatternRegistry,
    provider: Option<SharedProvider>,
    audit: Arc<AuditChain>,
    learning: Option<LearningRing>,
}

impl Orchestrator {
    pub fn new(
        registry: PatternRegistry,
        provider: Option<SharedProvider>,
        audit: Arc<AuditChain>,
        learning: Option<LearningRing>,
    ) -> Self {
        Self { registry, provider, audit, learning }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditChain {
        &self.audit
    }

    pub fn learning(&self) -> Option<&LearningRing> {
        self.learning.as_ref()
    }

    async fn active_learned_patterns(&self) -> Vec<StructuralPattern> {
        match &self.learning {
            Some(ring) => ring.get_active_patterns().await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to load active learned patterns, continuing without them");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    async fn record_learned_usage(&self, flags: &[Flag], external: &[StructuralPattern]) {
        let Some(ring) = &self.learning else { return };
        let external_ids: BTreeSet<&str> = external.iter().map(|p| p.id.as_str()).collect();
        for flag in flags {
            if external_ids.contains(flag.pattern_id.as_str()) {
                if let Err(e) = ring.record_evaluation(&flag.pattern_id).await {
                    tracing::error!(pattern_id = %flag.pattern_id, error = %e, "failed to record pattern evaluation");
                }
            }
        }
    }

    /// One scan, in whichever mode is requested. Validates input,
    /// builds the `ScanResult`, appends one audit event, and returns.
    pub async fn scan(&self, text: &str, mode: ScanMode, domain: Domain) -> Result<ScanResult, OrchestratorError> {
        validate_text(text)?;

        let external_patterns = self.active_learned_patterns().await;
        let evaluation = evaluate(text, domain, &external_patterns);
        self.record_learned_usage(&evaluation.flags, &external_patterns).await;

        let mut result = match mode {
            ScanMode::Local => self.local_result(text, &evaluation),
            ScanMode::Deep => self.deep_result(text, domain, &evaluation, mode).await,
            ScanMode::Full => self.full_result(text, domain, &evaluation, mode).await,
        };

        let event_type = match mode {
            ScanMode::Local => "scan_local",
            ScanMode::Deep => "scan_deep",
            ScanMode::Full => "scan_full",
        };
        match self.audit.append(event_type, audit_payload(&result), self.registry.core_version()).await {
            Ok(hash) => result.audit_hash = Some(hash),
            Err(e) => tracing::error!(error = %e, "audit append failed for scan, omitting audit_hash"),
        }

        Ok(result)
    }

    fn local_result(&self, text: &str, evaluation: &veritas_core::CoreEvaluation) -> ScanResult {
        let (truth_score, breakdown) = score(evaluation, None, &[]);
        assemble(
            text,
            truth_score,
            Some(breakdown),
            evaluation.flags.clone(),
            evaluation.knowledge_type,
            evaluation.confidence,
            evaluation.summary.clone(),
            evaluation.pit_tier_active.clone(),
            None,
            "local".to_string(),
            ScanMode::Local.as_str().to_string(),
            self.registry.core_version().to_string(),
            bias_types_from_flags(&evaluation.flags),
            None,
            None,
        )
    }

    async fn deep_result(
        &self,
        text: &str,
        domain: Domain,
        evaluation: &veritas_core::CoreEvaluation,
        requested_mode: ScanMode,
    ) -> ScanResult {
        let Some(provider) = self.provider.clone() else {
            return self.degraded_result(text, evaluation, requested_mode);
        };

        let local_ids: Vec<String> = evaluation.flags.iter().map(|f| f.pattern_id.clone()).collect();
        let deep = match run_deep_analysis(provider.as_ref(), &self.registry, domain, text, &local_ids).await {
            Ok(deep) => deep,
            Err(e) => {
                tracing::warn!(error = %e, "deep analysis failed, degrading to local-only");
                return self.degraded_result(text, evaluation, requested_mode);
            }
        };

        let learning_proposals = self.maybe_propose(provider.as_ref(), text, &deep, evaluation.structural_count()).await;
        self.build_collaborative_result(text, evaluation, &deep, "gemini+local", ScanMode::Deep.as_str(), learning_proposals, None)
            .await
    }

    async fn full_result(
        &self,
        text: &str,
        domain: Domain,
        evaluation: &veritas_core::CoreEvaluation,
        requested_mode: ScanMode,
    ) -> ScanResult {
        let Some(provider) = self.provider.clone() else {
            return self.degraded_result(text, evaluation, requested_mode);
        };

        let local_ids: Vec<String> = evaluation.flags.iter().map(|f| f.pattern_id.clone()).collect();
        let deep = match run_deep_analysis(provider.as_ref(), &self.registry, domain, text, &local_ids).await {
            Ok(deep) => deep,
            Err(e) => {
                tracing::warn!(error = %e, "deep analysis failed in full scan, degrading to local-only");
                return self.degraded_result(text, evaluation, requested_mode);
            }
        };

        let ai_flags = deep.flags.clone();
        let (provisional_score, _) = score(evaluation, deep_score_input(&deep).as_ref(), &ai_flags);
        let impact_projection = if provisional_score < IMPACT_PROJECTION_THRESHOLD {
            self.impact_projection(provider.as_ref(), text).await
        } else {
            None
        };

        let learning_proposals = self.maybe_propose(provider.as_ref(), text, &deep, evaluation.structural_count()).await;
        self.build_collaborative_result(text, evaluation, &deep, "gemini+local", ScanMode::Full.as_str(), learning_proposals, impact_projection)
            .await
    }

    async fn build_collaborative_result(
        &self,
        text: &str,
        evaluation: &veritas_core::CoreEvaluation,
        deep: &DeepAnalysis,
        source: &str,
        mode_label: &str,
        learning_proposals: Option<Vec<String>>,
        impact_projection: Option<veritas_core::ImpactProjection>,
    ) -> ScanResult {
        let ai_flags = deep.flags.clone();
        let merged = merge(evaluation, ai_flags.clone(), Some(deep));
        let (truth_score, breakdown) = score(evaluation, deep_score_input(deep).as_ref(), &ai_flags);

        let mut result = assemble(
            text,
            truth_score,
            Some(breakdown),
            merged.flags,
            merged.knowledge_type,
            merged.confidence,
            merged.explanation,
            merged.pit_tier,
            merged.pit_detail,
            source.to_string(),
            mode_label.to_string(),
            self.registry.core_version().to_string(),
            bias_types_from_deep(deep),
            merged.severity,
            learning_proposals,
        );
        result.impact_projection = impact_projection;
        result
    }

    fn degraded_result(&self, text: &str, evaluation: &veritas_core::CoreEvaluation, requested_mode: ScanMode) -> ScanResult {
        let (truth_score, breakdown) = score(evaluation, None, &[]);
        let capped = truth_score.min(DEGRADED_SCORE_CAP);
        let mut result = assemble(
            text,
            capped,
            Some(breakdown),
            evaluation.flags.clone(),
            evaluation.knowledge_type,
            evaluation.confidence,
            evaluation.summary.clone(),
            evaluation.pit_tier_active.clone(),
            None,
            "local_fallback".to_string(),
            format!("local (fallback from {requested_mode})"),
            self.registry.core_version().to_string(),
            bias_types_from_flags(&evaluation.flags),
            None,
            None,
        );
        result.degraded = true;
        result
    }

    async fn impact_projection(&self, provider: &dyn LlmProvider, text: &str) -> Option<veritas_core::ImpactProjection> {
        let prompt = format!(
            "In two short paragraphs, project the downstream effect of this text if its rhetorical distortions \
             are left uncorrected (\"status quo\") versus corrected (\"corrected\"). Respond with a single JSON \
             object: {{status_quo_path, corrected_path}}.\n\nTEXT:\n{text}"
        );
        let request = GenerateRequest::new(prompt, 0.7).json();
        let raw = provider.generate_json(request).await.ok()?;
        parse_impact_projection(raw)
    }

    async fn maybe_propose(
        &self,
        provider: &dyn LlmProvider,
        text: &str,
        deep: &DeepAnalysis,
        local_flag_count: usize,
    ) -> Option<Vec<String>> {
        let learning = self.learning.as_ref()?;
        let proposal = propose_pattern(provider, &self.registry, text, deep, local_flag_count).await?;

        match learning
            .propose(
                &proposal.pattern_id,
                &proposal.name,
                &proposal.description,
                proposal.pit_tier,
                proposal.severity,
                proposal.principle,
                &proposal.regex,
                &content_hash(text),
            )
            .await
        {
            Ok(pattern) => Some(vec![pattern.id]),
            Err(e) => {
                tracing::warn!(error = %e, "pattern proposal rejected");
                None
            }
        }
    }

    /// Iteratively rewrites `text`, starting from a prior scan's flags
    /// and truth score rather than re-running the evaluator. Appends
    /// one audit event on success.
    pub async fn correct(
        &self,
        text: &str,
        scan_result: &ScanResult,
        domain: Domain,
        max_iterations: u32,
    ) -> Result<CorrectionResult, OrchestratorError> {
        let Some(provider) = self.provider.clone() else {
            return Err(OrchestratorError::InvalidInput("correction requires a configured LLM provider".to_string()));
        };

        let original_structural_count = scan_result.flags.iter().filter(|f| f.is_structural()).count();
        let result = correction::correct(
            provider.as_ref(),
            text,
            domain,
            &scan_result.flags,
            original_structural_count,
            scan_result.truth_score,
            max_iterations,
        )
        .await;

        let payload = json!({
            "correction_triggered": result.correction_triggered,
            "converged": result.converged,
            "iteration_count": result.iterations.len(),
        });
        if let Err(e) = self.audit.append("correction", payload, self.registry.core_version()).await {
            tracing::error!(error = %e, "audit append failed for correction");
        }

        Ok(result)
    }

    /// Runs up to [`MAX_BATCH_LEN`] scans concurrently, preserving input
    /// order. A task that errors yields a placeholder result instead of
    /// aborting the batch.
    pub async fn batch_scan(
        self: Arc<Self>,
        items: Vec<(String, ScanMode, Domain)>,
    ) -> Result<Vec<ScanResult>, OrchestratorError> {
        if items.is_empty() || items.len() > MAX_BATCH_LEN {
            return Err(OrchestratorError::InvalidInput(format!(
                "batch size must be 1..={MAX_BATCH_LEN}, got {}",
                items.len()
            )));
        }

        let mut set = tokio::task::JoinSet::new();
        for (idx, (text, mode, domain)) in items.into_iter().enumerate() {
            let orchestrator = Arc::clone(&self);
            set.spawn(async move {
                let result = orchestrator.scan(&text, mode, domain).await;
                (idx, text, result)
            });
        }

        let mut results: Vec<Option<ScanResult>> = Vec::new();
        while let Some(joined) = set.join_next().await {
            let (idx, text, result) = joined.expect("scan task panicked");
            if results.len() <= idx {
                results.resize(idx + 1, None);
            }
            results[idx] = Some(result.unwrap_or_else(|e| placeholder_result(&text, &e)));
        }

        Ok(results.into_iter().map(|r| r.expect("every batch index was filled")).collect())
    }
}

fn validate_text(text: &str) -> Result<(), OrchestratorError> {
    let len = text.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(OrchestratorError::InvalidInput(format!(
            "text length must be 1..={MAX_TEXT_LEN} chars, got {len}"
        )));
    }
    Ok(())
}

fn deep_score_input(deep: &DeepAnalysis) -> Option<veritas_detect::DeepAnalysisInput> {
    if deep.severity.is_none() && deep.bias_types.is_empty() {
        return None;
    }
    Some(veritas_detect::DeepAnalysisInput { severity: deep.severity, bias_types: deep.bias_types.clone() })
}

fn bias_types_from_flags(flags: &[Flag]) -> BTreeSet<String> {
    flags
        .iter()
        .filter_map(|f| f.principle)
        .map(|p| p.as_str().to_lowercase())
        .collect()
}

fn bias_types_from_deep(deep: &DeepAnalysis) -> BTreeSet<String> {
    deep.bias_types.iter().filter(|t| t.as_str() != "none").cloned().collect()
}

fn audit_payload(result: &ScanResult) -> Value {
    json!({
        "truth_score": result.truth_score,
        "scan_mode": result.scan_mode,
        "source": result.source,
        "flag_count": result.flags.len(),
        "bias_detected": result.bias_detected,
    })
}

fn content_hash(text: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{digest:x}")
}

fn parse_impact_projection(raw: Value) -> Option<veritas_core::ImpactProjection> {
    let status_quo_path = raw.get("status_quo_path")?.as_str()?.to_string();
    let corrected_path = raw.get("corrected_path")?.as_str()?.to_string();
    Some(veritas_core::ImpactProjection { status_quo_path, corrected_path })
}

fn placeholder_result(text: &str, error: &OrchestratorError) -> ScanResult {
    assemble(
        text,
        0,
        None,
        Vec::new(),
        veritas_core::KnowledgeType::Neutral,
        0.0,
        format!("scan failed: {error}"),
        None,
        None,
        "error".to_string(),
        "error".to_string(),
        veritas_core::CORE_VERSION.to_string(),
        BTreeSet::new(),
        None,
        None,
    )
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    text: &str,
    truth_score: i32,
    breakdown: Option<veritas_core::ScoreBreakdown>,
    flags: Vec<Flag>,
    knowledge_type: veritas_core::KnowledgeType,
    confidence: f64,
    explanation: String,
    pit_tier: Option<String>,
    pit_detail: Option<veritas_core::PitTier>,
    source: String,
    scan_mode: String,
    core_version: String,
    bias_types: BTreeSet<String>,
    severity: Option<veritas_core::Severity>,
    learning_proposals: Option<Vec<String>>,
) -> ScanResult {
    ScanResult {
        text: text.to_string(),
        truth_score,
        knowledge_type,
        bias_detected: !bias_types.is_empty() || !flags.is_empty(),
        bias_types,
        pit_tier,
        pit_detail,
        severity,
        confidence,
        explanation,
        flags,
        impact_projection: None,
        scan_mode,
        source,
        core_version,
        audit_hash: None,
        score_breakdown: breakdown,
        learning_proposals,
        degraded: false,
    }
}
