//! Fire-and-forget audit dispatch
//!
//! Hands each entry to the sink on a detached task so a slow or failing
//! sink can never block or fail the pipeline. Failures are logged and
//! dropped; the trail is at-least-attempted, not guaranteed.

use crate::audit::store::AuditSink;
use crate::audit::types::AuditEntry;
use std::sync::Arc;

/// Dispatches audit entries without waiting on the sink
#[derive(Clone)]
pub struct AuditDispatcher {
    sink: Arc<dyn AuditSink>,
}

impl AuditDispatcher {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Queue one entry for the sink and return immediately
    pub fn dispatch(&self, entry: AuditEntry) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let transaction_id = entry.transaction_id.clone();
            let stage = entry.stage;
            if let Err(e) = sink.append(entry).await {
                tracing::warn!(
                    "Audit write failed for transaction {} stage {}: {}",
                    transaction_id,
                    stage,
                    e
                );
            }
        });
    }
}
