//! The governed learning ring: staging -> active -> deactivated.
//! All compound read-modify-write sequences run under one write lock so
//! `propose`/`report_false_positive` never race each other.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use sqlx::any::{AnyKind, AnyPoolOptions};
use sqlx::{AnyPool, Row};
use tokio::sync::Mutex;
use veritas_audit::AuditChain;
use veritas_core::{LearnedPattern, PatternStatus, PitTier, Principle, Severity, StructuralPattern, CORE_VERSION};

use crate::error::LearningError;

pub struct LearningRing {
    pool: AnyPool,
    write_lock: Mutex<()>,
    audit: Arc<AuditChain>,
    activation_threshold: u32,
    fp_limit: f64,
}

impl LearningRing {
    /// `audit` is shared with the orchestrator's own audit chain so the
    /// two write under the same single-writer mutex.
    pub async fn connect(
        database_url: &str,
        audit: Arc<AuditChain>,
        activation_threshold: u32,
        fp_limit: f64,
    ) -> Result<Self, LearningError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        let ring = Self { pool, write_lock: Mutex::new(()), audit, activation_threshold, fp_limit };
        ring.ensure_schema().await?;
        Ok(ring)
    }

    async fn ensure_schema(&self) -> Result<(), LearningError> {
        let bool_type = match self.pool.any_kind() {
            AnyKind::Postgres => "BOOLEAN",
            _ => "INTEGER",
        };
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS learned_patterns (
                pattern_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                pit_tier INTEGER NOT NULL,
                severity TEXT NOT NULL,
                principle TEXT NOT NULL,
                regex_source TEXT NOT NULL,
                min_matches INTEGER NOT NULL,
                suppress_if_cited {bool_type} NOT NULL,
                status TEXT NOT NULL,
                confirmations INTEGER NOT NULL,
                false_positives INTEGER NOT NULL,
                total_evaluations INTEGER NOT NULL,
                proposed_at TEXT NOT NULL,
                activated_at TEXT,
                deactivated_at TEXT,
                source_scan_hash TEXT NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Proposes a new pattern, or — if `pattern_id` already exists —
    /// records another independent confirmation of it. Transitions
    /// staging -> active once confirmations reach the threshold.
    pub async fn propose(
        &self,
        pattern_id: &str,
        name: &str,
        description: &str,
        pit_tier: PitTier,
        severity: Severity,
        principle: Principle,
        regex_source: &str,
        source_scan_hash: &str,
    ) -> Result<LearnedPattern, LearningError> {
        let _guard = self.write_lock.lock().await;

        if let Some(mut existing) = self.fetch(pattern_id).await? {
            existing.confirmations += 1;
            let mut event = "pattern_confirmed";
            if existing.status == PatternStatus::Staging
                && existing.confirmations >= self.activation_threshold
            {
                existing.status = PatternStatus::Active;
                existing.activated_at = Some(Utc::now());
                event = "pattern_activated";
            }
            self.update(&existing).await?;
            if let Err(e) = self
                .audit
                .append(event, json!({"pattern_id": existing.id, "confirmations": existing.confirmations}), CORE_VERSION)
                .await
            {
                tracing::error!(pattern_id = %existing.id, error = %e, "failed to append audit event");
            }
            return Ok(existing);
        }

        StructuralPattern::try_from_source(
            pattern_id.to_string(),
            name.to_string(),
            description.to_string(),
            pit_tier,
            severity,
            principle,
            regex_source,
            1,
            false,
        )
        .map_err(|e| LearningError::InvalidProposal(format!("regex does not compile: {e}")))?;

        let pattern = LearnedPattern::new(
            pattern_id.to_string(),
            name.to_string(),
            description.to_string(),
            pit_tier,
            severity,
            principle,
            regex_source.to_string(),
            source_scan_hash.to_string(),
            Utc::now(),
        );
        self.insert(&pattern).await?;
        if let Err(e) = self
            .audit
            .append("pattern_proposed", json!({"pattern_id": pattern.id}), CORE_VERSION)
            .await
        {
            tracing::error!(pattern_id = %pattern.id, error = %e, "failed to append audit event");
        }
        Ok(pattern)
    }

    /// Records a false-positive report against an active or staging
    /// pattern; deactivates it once its FP rate exceeds `fp_limit`.
    pub async fn report_false_positive(&self, pattern_id: &str) -> Result<LearnedPattern, LearningError> {
        let _guard = self.write_lock.lock().await;

        let mut pattern = self
            .fetch(pattern_id)
            .await?
            .ok_or_else(|| LearningError::UnknownPattern(pattern_id.to_string()))?;

        pattern.false_positives += 1;
        if pattern.status == PatternStatus::Active
            && pattern.total_evaluations > 0
            && pattern.false_positive_rate() > self.fp_limit
        {
            pattern.status = PatternStatus::Deactivated;
            pattern.deactivated_at = Some(Utc::now());
            self.update(&pattern).await?;
            if let Err(e) = self
                .audit
                .append(
                    "pattern_deactivated",
                    json!({"pattern_id": pattern.id, "false_positive_rate": pattern.false_positive_rate()}),
                    CORE_VERSION,
                )
                .await
            {
                tracing::error!(pattern_id = %pattern.id, error = %e, "failed to append audit event");
            }
        } else {
            self.update(&pattern).await?;
        }
        Ok(pattern)
    }

    /// Increments the evaluation counter for a learned pattern that
    /// participated in a scan. Called by the evaluator's caller, not by
    /// the evaluator itself (the evaluator is pure).
    pub async fn record_evaluation(&self, pattern_id: &str) -> Result<(), LearningError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("UPDATE learned_patterns SET total_evaluations = total_evaluations + 1 WHERE pattern_id = ?")
            .bind(pattern_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Active learned patterns, shaped as `StructuralPattern`s so the
    /// evaluator cannot distinguish them from the frozen catalog.
    pub async fn get_active_patterns(&self) -> Result<Vec<StructuralPattern>, LearningError> {
        let rows = sqlx::query(
            "SELECT pattern_id, name, description, pit_tier, severity, principle, regex_source,
                    min_matches, suppress_if_cited, status, confirmations, false_positives,
                    total_evaluations, proposed_at, activated_at, deactivated_at, source_scan_hash
             FROM learned_patterns WHERE status = 'active'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut patterns = Vec::with_capacity(rows.len());
        for row in rows {
            let learned = row_to_learned_pattern(row)?;
            if let Ok(pattern) = StructuralPattern::try_from_source(
                learned.id.clone(),
                learned.name.clone(),
                learned.description.clone(),
                learned.pit_tier,
                learned.severity,
                learned.principle,
                &learned.regex_source,
                learned.min_matches,
                learned.suppress_if_cited,
            ) {
                patterns.push(pattern);
            } else {
                tracing::warn!(pattern_id = %learned.id, "active learned pattern no longer compiles, skipping");
            }
        }
        Ok(patterns)
    }

    async fn fetch(&self, pattern_id: &str) -> Result<Option<LearnedPattern>, LearningError> {
        let row = sqlx::query(
            "SELECT pattern_id, name, description, pit_tier, severity, principle, regex_source,
                    min_matches, suppress_if_cited, status, confirmations, false_positives,
                    total_evaluations, proposed_at, activated_at, deactivated_at, source_scan_hash
             FROM learned_patterns WHERE pattern_id = ?",
        )
        .bind(pattern_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_learned_pattern).transpose()
    }

    async fn insert(&self, pattern: &LearnedPattern) -> Result<(), LearningError> {
        sqlx::query(
            "INSERT INTO learned_patterns
                (pattern_id, name, description, pit_tier, severity, principle, regex_source,
                 min_matches, suppress_if_cited, status, confirmations, false_positives,
                 total_evaluations, proposed_at, activated_at, deactivated_at, source_scan_hash)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&pattern.id)
        .bind(&pattern.name)
        .bind(&pattern.description)
        .bind(pattern.pit_tier.as_u8() as i64)
        .bind(pattern.severity.as_str())
        .bind(pattern.principle.as_str())
        .bind(&pattern.regex_source)
        .bind(pattern.min_matches as i64)
        .bind(pattern.suppress_if_cited as i64)
        .bind(pattern.status.as_str())
        .bind(pattern.confirmations as i64)
        .bind(pattern.false_positives as i64)
        .bind(pattern.total_evaluations as i64)
        .bind(pattern.proposed_at.to_rfc3339())
        .bind(pattern.activated_at.map(|t| t.to_rfc3339()))
        .bind(pattern.deactivated_at.map(|t| t.to_rfc3339()))
        .bind(&pattern.source_scan_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, pattern: &LearnedPattern) -> Result<(), LearningError> {
        sqlx::query(
            "UPDATE learned_patterns SET
                status = ?, confirmations = ?, false_positives = ?, total_evaluations = ?,
                activated_at = ?, deactivated_at = ?
             WHERE pattern_id = ?",
        )
        .bind(pattern.status.as_str())
        .bind(pattern.confirmations as i64)
        .bind(pattern.false_positives as i64)
        .bind(pattern.total_evaluations as i64)
        .bind(pattern.activated_at.map(|t| t.to_rfc3339()))
        .bind(pattern.deactivated_at.map(|t| t.to_rfc3339()))
        .bind(&pattern.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_learned_pattern(row: sqlx::any::AnyRow) -> Result<LearnedPattern, LearningError> {
    let pit_tier_num: i64 = row.try_get("pit_tier")?;
    let pit_tier = PitTier::from_u8(pit_tier_num as u8)
        .ok_or_else(|| LearningError::InvalidProposal(format!("stored pit_tier {pit_tier_num} is out of range")))?;

    let severity_str: String = row.try_get("severity")?;
    let severity = Severity::parse(&severity_str)
        .ok_or_else(|| LearningError::InvalidProposal(format!("stored severity {severity_str} is invalid")))?;

    let principle_str: String = row.try_get("principle")?;
    let principle = Principle::parse(&principle_str)
        .ok_or_else(|| LearningError::InvalidProposal(format!("stored principle {principle_str} is invalid")))?;

    let status_str: String = row.try_get("status")?;
    let status = PatternStatus::parse(&status_str)
        .ok_or_else(|| LearningError::InvalidProposal(format!("stored status {status_str} is invalid")))?;

    let min_matches: i64 = row.try_get("min_matches")?;
    let suppress_if_cited: i64 = row.try_get("suppress_if_cited")?;
    let confirmations: i64 = row.try_get("confirmations")?;
    let false_positives: i64 = row.try_get("false_positives")?;
    let total_evaluations: i64 = row.try_get("total_evaluations")?;

    let proposed_at: String = row.try_get("proposed_at")?;
    let activated_at: Option<String> = row.try_get("activated_at")?;
    let deactivated_at: Option<String> = row.try_get("deactivated_at")?;

    Ok(LearnedPattern {
        id: row.try_get("pattern_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        pit_tier,
        severity,
        principle,
        regex_source: row.try_get("regex_source")?,
        min_matches: min_matches as usize,
        suppress_if_cited: suppress_if_cited != 0,
        status,
        confirmations: confirmations as u32,
        false_positives: false_positives as u32,
        total_evaluations: total_evaluations as u32,
        proposed_at: parse_timestamp(&proposed_at)?,
        activated_at: activated_at.map(|s| parse_timestamp(&s)).transpose()?,
        deactivated_at: deactivated_at.map(|s| parse_timestamp(&s)).transpose()?,
        source_scan_hash: row.try_get("source_scan_hash")?,
    })
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<Utc>, LearningError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LearningError::InvalidProposal(format!("stored timestamp {raw} is not rfc3339: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_ring(activation_threshold: u32, fp_limit: f64) -> LearningRing {
        let audit = Arc::new(AuditChain::connect("sqlite::memory:").await.expect("audit connect"));
        LearningRing::connect("sqlite::memory:", audit, activation_threshold, fp_limit)
            .await
            .expect("ring connect")
    }

    #[tokio::test]
    async fn first_proposal_stages_with_one_confirmation() {
        let ring = memory_ring(5, 0.15).await;
        let pattern = ring
            .propose("L_TEST_abc123", "test", "desc", PitTier::Tier1, Severity::Moderate, Principle::Truth, "foo", "hash1")
            .await
            .unwrap();
        assert_eq!(pattern.status, PatternStatus::Staging);
        assert_eq!(pattern.confirmations, 1);
    }

    #[tokio::test]
    async fn repeated_confirmation_activates_at_threshold() {
        let ring = memory_ring(3, 0.15).await;
        for _ in 0..3 {
            ring.propose("L_TEST_abc123", "test", "desc", PitTier::Tier1, Severity::Moderate, Principle::Truth, "foo", "hash1")
                .await
                .unwrap();
        }
        let active = ring.get_active_patterns().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "L_TEST_abc123");
    }

    #[tokio::test]
    async fn invalid_regex_is_rejected() {
        let ring = memory_ring(5, 0.15).await;
        let result = ring
            .propose("L_TEST_bad", "test", "desc", PitTier::Tier1, Severity::Moderate, Principle::Truth, "(unclosed", "hash1")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn false_positive_rate_above_limit_deactivates() {
        let ring = memory_ring(1, 0.2).await;
        ring.propose("L_TEST_abc123", "test", "desc", PitTier::Tier1, Severity::Moderate, Principle::Truth, "foo", "hash1")
            .await
            .unwrap();
        for _ in 0..10 {
            ring.record_evaluation("L_TEST_abc123").await.unwrap();
        }
        for _ in 0..3 {
            ring.report_false_positive("L_TEST_abc123").await.unwrap();
        }
        let active = ring.get_active_patterns().await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn unknown_pattern_false_positive_report_errors() {
        let ring = memory_ring(5, 0.15).await;
        let result = ring.report_false_positive("L_DOES_NOT_EXIST").await;
        assert!(matches!(result, Err(LearningError::UnknownPattern(_))));
    }
}
