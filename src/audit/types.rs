//! Audit trail types
//!
//! Defines the durable counterpart of a pipeline stage record. All types
//! use camelCase JSON serialization on the wire.

use crate::pipeline::types::{Stage, StageRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single audit trail entry
///
/// Keyed by `(transaction_id, stage, timestamp)`. Carries the full stage
/// record payload so a trail can be reviewed without the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub transaction_id: String,
    pub caller_id: String,
    #[serde(rename = "stageName")]
    pub stage: Stage,
    pub input: Value,
    pub output: Value,
    pub decision: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Build the durable entry for one stage record
    pub fn from_record(transaction_id: &str, caller_id: &str, record: &StageRecord) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            caller_id: caller_id.to_string(),
            stage: record.stage,
            input: record.input.clone(),
            output: record.output.clone(),
            decision: record.decision.clone(),
            timestamp: record.timestamp,
        }
    }
}
