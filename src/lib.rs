//! PromptGate - LLM Prompt Governance Service
//!
//! PromptGate is a governance proxy for LLM prompts: every prompt is
//! redacted, checked against policy, and scored before a verdict is
//! returned, and every stage of that decision is written to an
//! append-only audit trail.
//!
//! ## Architecture
//!
//! ```text
//!          ┌───────────────────────────────────────────────────────────┐
//!          │                        Supervisor                         │
//!          │                                                           │
//!          │   ┌────────────┐    ┌───────────────┐    ┌─────────────┐  │
//!          │   │  Redactor  │───▶│ Policy Oracle │───▶│   Verdict   │  │
//!          │   │ regex PII  │    │ rule / http   │    │ Synthesizer │  │
//!          │   │ scrubbing  │    │ fail-closed   │    │ PASS/MODIFY │  │
//!          │   │            │    │               │    │ /BLOCK+risk │  │
//!          │   └─────┬──────┘    └───────┬───────┘    └──────┬──────┘  │
//!          │         │                   │                   │         │
//!          │         └─────────── stage records ─────────────┘         │
//!          │                             │                             │
//!          └─────────────────────────────┼─────────────────────────────┘
//!                                        │ fire-and-forget
//!                                        ▼
//!                          ┌──────────────────────────┐
//!                          │     Audit Dispatcher     │
//!                          │  append-only JSONL trail │
//!                          │     per transaction      │
//!                          └──────────────────────────┘
//! ```
//!
//! ## Key Features
//!
//! ### Supervised Pipeline
//! - Fixed stage order: receipt, redaction, policy check, synthesis, audit
//! - Every stage appends to a per-transaction trace
//! - Stage failures degrade the result, they never skip a stage
//!
//! ### Fail-Closed Policy
//! - Oracle outages are treated as non-compliance
//! - BLOCK always dominates MODIFY
//! - Deterministic risk scoring per disposition
//!
//! ### Append-Only Audit
//! - One JSONL trail file per transaction
//! - Writes are detached from the request path
//! - Query API for trails and recent activity
//!
//! ## Modules
//!
//! - [`pipeline`]: Supervisor orchestration, stage trace, and verdict synthesis
//! - [`redaction`]: Pattern-based PII scrubbing
//! - [`policy`]: Rule-based and remote policy oracles
//! - [`audit`]: Append-only audit trail and its query API
//! - [`api`]: HTTP surface assembled from the module routers
//! - [`config`]: Configuration management

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod redaction;

pub use config::PromptgateConfig;
pub use error::{Error, Result};
