//! Pipeline module, the supervised governance flow
//!
//! A transaction moves through a fixed stage order: receipt, redaction,
//! policy check, verdict synthesis, audit summary. The supervisor owns the
//! sequencing, the trace accumulator records it, and the verdict table maps
//! the recorded outcomes to PASS, MODIFY, or BLOCK.

pub mod handler;
pub mod supervisor;
pub mod trace;
pub mod types;
pub mod verdict;

pub use handler::{pipeline_router, PipelineState};
pub use supervisor::Supervisor;
pub use trace::TraceAccumulator;
pub use types::{
    Citation, Disposition, PolicyOutcome, ProcessRequest, RedactionOutcome, Stage, StageRecord,
    Transaction,
};
pub use verdict::{synthesize, Verdict};
