//! Append-only trace accumulator
//!
//! Holds the ordered stage records for one transaction while it executes.
//! Cloning the accumulator shares the underlying trace, so a reader can
//! observe progress concurrently while the orchestrator appends. Entries are
//! never reordered or removed.

use crate::pipeline::types::{Stage, StageRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct TraceAccumulator {
    inner: Arc<RwLock<TraceInner>>,
}

#[derive(Debug, Default)]
struct TraceInner {
    records: Vec<StageRecord>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl TraceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage record and return a copy of it.
    ///
    /// Timestamps are clamped to be non-decreasing within the trace; a
    /// wall-clock step backwards reuses the previous timestamp, with trace
    /// order breaking the tie.
    pub async fn append(
        &self,
        stage: Stage,
        input: Value,
        output: Value,
        decision: impl Into<String>,
    ) -> StageRecord {
        let mut inner = self.inner.write().await;

        let mut timestamp = Utc::now();
        if let Some(last) = inner.last_timestamp {
            if timestamp < last {
                timestamp = last;
            }
        }
        inner.last_timestamp = Some(timestamp);

        let record = StageRecord {
            stage,
            input,
            output,
            decision: decision.into(),
            timestamp,
        };
        inner.records.push(record.clone());
        record
    }

    /// Copy of the records appended so far, in append order.
    pub async fn snapshot(&self) -> Vec<StageRecord> {
        self.inner.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}
