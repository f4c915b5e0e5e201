//! Core types for the governance pipeline
//!
//! Defines the transaction record, the fixed stage enumeration, stage
//! records, collaborator outcomes, and the API wire types. All wire types
//! use camelCase JSON serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal outcome of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Disposition {
    Pass,
    Modify,
    Block,
}

impl Disposition {
    /// Short label recorded as the synthesis stage decision.
    pub fn decision_label(&self) -> &'static str {
        match self {
            Self::Pass => "Passed",
            Self::Modify => "Modified",
            Self::Block => "Blocked",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Modify => write!(f, "MODIFY"),
            Self::Block => write!(f, "BLOCK"),
        }
    }
}

/// Fixed stage enumeration, in execution order
///
/// The derived `Ord` follows declaration order, so stage sequencing can be
/// checked with plain comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    PromptReceived,
    Redaction,
    PolicyCheck,
    Synthesis,
    AuditLogged,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PromptReceived => write!(f, "promptReceived"),
            Self::Redaction => write!(f, "redaction"),
            Self::PolicyCheck => write!(f, "policyCheck"),
            Self::Synthesis => write!(f, "synthesis"),
            Self::AuditLogged => write!(f, "auditLogged"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promptReceived" => Ok(Self::PromptReceived),
            "redaction" => Ok(Self::Redaction),
            "policyCheck" => Ok(Self::PolicyCheck),
            "synthesis" => Ok(Self::Synthesis),
            "auditLogged" => Ok(Self::AuditLogged),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

/// One entry in a transaction's trace, immutable once appended
///
/// `input` and `output` are opaque stage payloads; the orchestrator records
/// them but never re-interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    #[serde(rename = "stageName")]
    pub stage: Stage,
    pub input: Value,
    pub output: Value,
    pub decision: String,
    pub timestamp: DateTime<Utc>,
}

/// One governance request from receipt to final disposition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub caller_id: String,
    pub original_prompt: String,
    pub processed_prompt: String,
    pub disposition: Disposition,
    pub risk_score: f64,
    pub advisory_message: String,
    pub received_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub trace: Vec<StageRecord>,
}

/// Redactor output: sanitized text plus the names of the patterns that matched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionOutcome {
    pub sanitized_text: String,
    pub matched_patterns: Vec<String>,
}

impl RedactionOutcome {
    pub fn was_redacted(&self) -> bool {
        !self.matched_patterns.is_empty()
    }
}

/// Policy oracle output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOutcome {
    pub compliant: bool,
    pub rationale: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl PolicyOutcome {
    /// Fail-closed default used when the oracle errors or times out.
    pub fn unavailable() -> Self {
        Self {
            compliant: false,
            rationale: "policy check unavailable".to_string(),
            citations: Vec::new(),
        }
    }
}

/// A policy rule citation supporting a non-compliant verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub reference: String,
    pub excerpt: String,
}

/// Request body for `POST /api/v1/process`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub prompt: String,
    pub caller_id: String,
    /// Caller-supplied transaction id; generated at receipt when absent.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "NOT_FOUND".to_string(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "BAD_REQUEST".to_string(),
                message: message.into(),
            },
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: message.into(),
            },
        }
    }
}
