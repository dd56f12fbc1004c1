//! The append-only hash chain. One writer critical section
//! guards `append` so `prev_hash` reads are always consistent with the
//! last persisted row; reads are otherwise lock-free.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::any::{AnyKind, AnyPoolOptions};
use sqlx::{AnyPool, Row};
use tokio::sync::Mutex;
use veritas_core::audit_entry::GENESIS_HASH;
use veritas_core::AuditEntry;

use crate::canonical::canonical_json;
use crate::error::AuditError;

/// One entry whose stored hash does not match the recomputed hash, or
/// whose `prev_hash` does not match its predecessor's stored hash.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BrokenLink {
    pub id: i64,
    pub failure_mode: FailureMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    HashMismatch,
    ChainBreak,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub checked: usize,
    pub broken_links: Vec<BrokenLink>,
}

pub struct AuditChain {
    pool: AnyPool,
    write_lock: Mutex<()>,
}

impl AuditChain {
    pub async fn connect(database_url: &str) -> Result<Self, AuditError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        let chain = Self { pool, write_lock: Mutex::new(()) };
        chain.ensure_schema().await?;
        Ok(chain)
    }

    async fn ensure_schema(&self) -> Result<(), AuditError> {
        let id_column = match self.pool.any_kind() {
            AnyKind::Postgres => "id BIGSERIAL PRIMARY KEY",
            _ => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS audit_chain (
                {id_column},
                prev_hash TEXT NOT NULL,
                hash TEXT NOT NULL,
                event_type TEXT NOT NULL,
                data TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                core_version TEXT NOT NULL
            )"
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_audit_chain_event_type ON audit_chain(event_type)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_audit_chain_timestamp ON audit_chain(timestamp)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Appends one event, returning its hash. Serialized against other
    /// writers so `prev_hash` always reflects the last committed row.
    pub async fn append(
        &self,
        event_type: &str,
        data: Value,
        core_version: &str,
    ) -> Result<String, AuditError> {
        let _guard = self.write_lock.lock().await;

        let prev_hash = self.last_hash().await?;
        let timestamp = Utc::now();
        let data_str = canonical_json(&data);
        let hash = compute_hash(&prev_hash, event_type, &data_str, &timestamp, core_version);

        sqlx::query(
            "INSERT INTO audit_chain (prev_hash, hash, event_type, data, timestamp, core_version)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&prev_hash)
        .bind(&hash)
        .bind(event_type)
        .bind(&data_str)
        .bind(timestamp.to_rfc3339())
        .bind(core_version)
        .execute(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn last_hash(&self) -> Result<String, AuditError> {
        let row = sqlx::query("SELECT hash FROM audit_chain ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => row.try_get::<String, _>("hash")?,
            None => GENESIS_HASH.to_string(),
        })
    }

    /// The `limit` most recent entries, newest-first, optionally
    /// filtered to a single event type.
    pub async fn recent(
        &self,
        limit: i64,
        event_type: Option<&str>,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let rows = match event_type {
            Some(kind) => {
                sqlx::query(
                    "SELECT id, prev_hash, hash, event_type, data, timestamp, core_version
                     FROM audit_chain WHERE event_type = ? ORDER BY id DESC LIMIT ?",
                )
                .bind(kind)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, prev_hash, hash, event_type, data, timestamp, core_version
                     FROM audit_chain ORDER BY id DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(row_to_entry).collect()
    }

    /// Recomputes every hash over the oldest `limit` entries and
    /// compares each `prev_hash` to its predecessor's stored hash.
    /// Never mutates the chain.
    pub async fn verify(&self, limit: i64) -> Result<VerificationReport, AuditError> {
        let rows = sqlx::query(
            "SELECT id, prev_hash, hash, event_type, data, timestamp, core_version
             FROM audit_chain ORDER BY id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let entries: Vec<AuditEntry> = rows.into_iter().map(row_to_entry).collect::<Result<_, _>>()?;

        let mut broken_links = Vec::new();
        let mut expected_prev = if entries.first().map(|e| e.id) == Some(1) {
            GENESIS_HASH.to_string()
        } else {
            entries
                .first()
                .map(|e| e.prev_hash.clone())
                .unwrap_or_else(|| GENESIS_HASH.to_string())
        };

        for entry in &entries {
            let data_str = canonical_json(&entry.data);
            let recomputed = compute_hash(
                &entry.prev_hash,
                &entry.event_type,
                &data_str,
                &entry.timestamp,
                &entry.core_version,
            );
            if recomputed != entry.hash {
                broken_links.push(BrokenLink { id: entry.id, failure_mode: FailureMode::HashMismatch });
            } else if entry.prev_hash != expected_prev {
                broken_links.push(BrokenLink { id: entry.id, failure_mode: FailureMode::ChainBreak });
            }
            expected_prev = entry.hash.clone();
        }

        Ok(VerificationReport {
            verified: broken_links.is_empty(),
            checked: entries.len(),
            broken_links,
        })
    }
}

fn compute_hash(
    prev_hash: &str,
    event_type: &str,
    data_str: &str,
    timestamp: &DateTime<Utc>,
    core_version: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(event_type.as_bytes());
    hasher.update(data_str.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(core_version.as_bytes());
    hex::encode(hasher.finalize())
}

fn row_to_entry(row: sqlx::any::AnyRow) -> Result<AuditEntry, AuditError> {
    let data_str: String = row.try_get("data")?;
    let data: Value = serde_json::from_str(&data_str)
        .map_err(|e| AuditError::InvalidData(format!("stored audit data is not valid json: {e}")))?;
    let timestamp_str: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| AuditError::InvalidData(format!("stored timestamp is not rfc3339: {e}")))?
        .with_timezone(&Utc);
    Ok(AuditEntry {
        id: row.try_get("id")?,
        prev_hash: row.try_get("prev_hash")?,
        hash: row.try_get("hash")?,
        event_type: row.try_get("event_type")?,
        data,
        timestamp,
        core_version: row.try_get("core_version")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_chain() -> AuditChain {
        AuditChain::connect("sqlite::memory:").await.expect("connect")
    }

    #[tokio::test]
    async fn first_entry_chains_from_genesis() {
        let chain = memory_chain().await;
        chain.append("scan_completed", json!({"a": 1}), "1.0.0").await.unwrap();
        let entries = chain.recent(1, None).await.unwrap();
        assert_eq!(entries[0].prev_hash, GENESIS_HASH);
    }

    #[tokio::test]
    async fn successive_entries_link_by_hash() {
        let chain = memory_chain().await;
        let first = chain.append("scan_completed", json!({"a": 1}), "1.0.0").await.unwrap();
        chain.append("scan_completed", json!({"a": 2}), "1.0.0").await.unwrap();
        let entries = chain.recent(2, None).await.unwrap();
        let second_oldest = entries.iter().find(|e| e.id == 2).unwrap();
        assert_eq!(second_oldest.prev_hash, first);
    }

    #[tokio::test]
    async fn verify_reports_clean_chain() {
        let chain = memory_chain().await;
        for i in 0..3 {
            chain.append("scan_completed", json!({"i": i}), "1.0.0").await.unwrap();
        }
        let report = chain.verify(10).await.unwrap();
        assert!(report.verified);
        assert!(report.broken_links.is_empty());
        assert_eq!(report.checked, 3);
    }

    #[tokio::test]
    async fn tampered_middle_entry_is_flagged_alone() {
        let chain = memory_chain().await;
        for i in 0..3 {
            chain.append("scan_completed", json!({"i": i}), "1.0.0").await.unwrap();
        }
        sqlx::query("UPDATE audit_chain SET data = ? WHERE id = 2")
            .bind(r#"{"i":99}"#)
            .execute(&chain.pool)
            .await
            .unwrap();

        let report = chain.verify(10).await.unwrap();
        assert!(!report.verified);
        assert_eq!(report.broken_links.len(), 1);
        assert_eq!(report.broken_links[0].id, 2);
        assert_eq!(report.broken_links[0].failure_mode, FailureMode::HashMismatch);
    }

    #[tokio::test]
    async fn event_type_filter_narrows_results() {
        let chain = memory_chain().await;
        chain.append("scan_completed", json!({}), "1.0.0").await.unwrap();
        chain.append("pattern_promoted", json!({}), "1.0.0").await.unwrap();
        let entries = chain.recent(10, Some("pattern_promoted")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "pattern_promoted");
    }
}
