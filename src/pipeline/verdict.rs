//! Verdict synthesis
//!
//! Pure mapping from {redaction outcome, policy outcome} to a disposition,
//! an advisory message, and a risk score. No I/O, total over its inputs, and
//! deterministic: the same stage outputs always produce the same verdict.
//!
//! Precedence is evaluated top to bottom and the first matching row wins:
//!
//! | Policy compliant | Redaction occurred | Disposition |
//! |------------------|--------------------|-------------|
//! | false            | any                | BLOCK       |
//! | true             | true               | MODIFY      |
//! | true             | false              | PASS        |
//!
//! Policy non-compliance dominates a redaction event, so a request that is
//! both redacted and non-compliant resolves to BLOCK.

use crate::pipeline::types::{Disposition, PolicyOutcome};
use serde::{Deserialize, Serialize};

/// Base risk score for a compliant, unredacted request.
pub const RISK_PASS: f64 = 1.2;
/// Base risk score for a redacted but compliant request.
pub const RISK_MODIFY: f64 = 6.5;
/// Base risk score for a non-compliant request.
pub const RISK_BLOCK: f64 = 8.2;

/// Risk added per supporting citation on a BLOCK verdict.
const CITATION_RISK_STEP: f64 = 0.3;
/// Risk scores never exceed this value.
const RISK_CAP: f64 = 10.0;

/// Synthesizer output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub disposition: Disposition,
    pub advisory_message: String,
    pub risk_score: f64,
}

/// Map stage outputs to the final verdict.
///
/// `redaction_occurred` is the orchestrator's view of the redaction stage,
/// which also covers the degraded-redactor case where no pattern names are
/// available.
pub fn synthesize(
    redaction_occurred: bool,
    matched_patterns: &[String],
    policy: &PolicyOutcome,
) -> Verdict {
    if !policy.compliant {
        return Verdict {
            disposition: Disposition::Block,
            advisory_message: block_advisory(&policy.rationale),
            risk_score: block_risk(policy.citations.len()),
        };
    }

    if redaction_occurred {
        return Verdict {
            disposition: Disposition::Modify,
            advisory_message: modify_advisory(matched_patterns),
            risk_score: RISK_MODIFY,
        };
    }

    Verdict {
        disposition: Disposition::Pass,
        advisory_message: "Your request was processed successfully.".to_string(),
        risk_score: RISK_PASS,
    }
}

/// BLOCK risk: base plus a per-citation severity step, capped.
fn block_risk(citation_count: usize) -> f64 {
    let adjusted = RISK_BLOCK + CITATION_RISK_STEP * citation_count as f64;
    adjusted.min(RISK_CAP)
}

fn block_advisory(rationale: &str) -> String {
    format!(
        "Your request has been blocked. Reason: {} Suggestion: Please engage \
         the appropriate team to ensure compliance with data protection \
         regulations.",
        rationale
    )
}

fn modify_advisory(matched_patterns: &[String]) -> String {
    let categories = if matched_patterns.is_empty() {
        "unverified content".to_string()
    } else {
        matched_patterns.join(", ")
    };
    format!(
        "Your request has been partially fulfilled. Reason: To protect \
         customer privacy, direct inclusion of PII ({}) in prompts is \
         restricted. Suggestion: Please use the approved CRM system to \
         contact the user, which manages user consent and communication \
         templates.",
        categories
    )
}
