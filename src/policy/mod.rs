//! Policy compliance checking
//!
//! The pipeline consumes the `PolicyOracle` contract: a compliance verdict,
//! a rationale, and zero or more supporting citations for a (possibly
//! redacted) prompt. Two oracles ship here:
//! - `RulePolicyOracle`: deterministic keyword rules with regulation
//!   citations, evaluated locally.
//! - `HttpPolicyOracle`: delegates to an external compliance service over
//!   JSON; may fail, in which case the orchestrator falls back to its
//!   fail-closed default.

pub mod http;
pub mod rules;

use crate::error::Result;
use crate::pipeline::types::PolicyOutcome;
use async_trait::async_trait;

pub use http::HttpPolicyOracle;
pub use rules::RulePolicyOracle;

/// Checks a prompt against organizational policy.
///
/// Callers apply their own timeout; an implementation that hangs is treated
/// as a failed stage.
#[async_trait]
pub trait PolicyOracle: Send + Sync {
    async fn check(&self, text: &str) -> Result<PolicyOutcome>;
}
