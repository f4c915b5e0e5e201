//! PromptGate error types

use crate::pipeline::types::{Stage, StageRecord};
use thiserror::Error;

/// PromptGate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing prompt, rejected before any stage runs
    #[error("Input error: {0}")]
    Input(String),

    /// A pipeline stage failed or timed out. Absorbed by the orchestrator
    /// under the fail-closed policy and recorded in the stage output; never
    /// surfaced to the caller.
    #[error("Stage degraded: {stage}: {reason}")]
    StageDegraded { stage: Stage, reason: String },

    /// Audit sink write failure. Logged by the dispatcher, never propagated.
    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    /// Unrecoverable internal fault. Carries whatever partial trace the
    /// transaction accumulated before it was abandoned.
    #[error("Transaction failed: {message}")]
    Transaction {
        message: String,
        trace: Vec<StageRecord>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Degraded-stage constructor used by stage adapters.
    pub fn degraded(stage: Stage, reason: impl Into<String>) -> Self {
        Error::StageDegraded {
            stage,
            reason: reason.into(),
        }
    }
}

/// Result type alias for PromptGate operations
pub type Result<T> = std::result::Result<T, Error>;
