//! Audit module, the append-only side channel of the pipeline
//!
//! Every stage record is mirrored to the trail through a fire-and-forget
//! dispatcher and persisted as per-transaction JSONL files under
//! `~/.promptgate/audit/` by default. A small read API serves stored
//! trails for after-the-fact review.

pub mod dispatcher;
pub mod handler;
pub mod store;
pub mod types;

pub use dispatcher::AuditDispatcher;
pub use handler::{audit_router, AuditState};
pub use store::{AuditQuery, AuditSink, JsonlAuditSink, MemoryAuditSink};
pub use types::AuditEntry;
