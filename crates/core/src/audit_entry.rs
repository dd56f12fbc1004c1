use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Genesis `prev_hash` value for an empty chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

const _ASSERT_GENESIS_HASH_LEN_64: () = assert!(GENESIS_HASH.len() == 64);

/// An append-only, hash-linked audit record. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub prev_hash: String,
    pub hash: String,
    pub event_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub core_version: String,
}
