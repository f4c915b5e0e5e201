//! PII redaction
//!
//! The pipeline only depends on the `Redactor` contract: sanitized text plus
//! the names of the patterns that matched. The shipped implementation is a
//! compiled regex set; any detection strategy can stand behind the trait
//! without touching the orchestrator.

pub mod pattern;

use crate::error::Result;
use crate::pipeline::types::RedactionOutcome;
use async_trait::async_trait;

pub use pattern::PatternRedactor;

/// Scans text for PII and returns a sanitized copy.
///
/// Implementations must be deterministic and idempotent: redacting an
/// already-sanitized string returns it unchanged with an empty match list.
#[async_trait]
pub trait Redactor: Send + Sync {
    async fn redact(&self, text: &str) -> Result<RedactionOutcome>;
}
