//! Audit entry persistence
//!
//! The JSONL sink keeps every entry in memory and mirrors it to a
//! per-transaction `.jsonl` file under the audit directory, one JSON entry
//! per line, reloading existing trails on startup. The memory sink holds
//! entries in memory only and doubles as the test sink.
//!
//! Writes go through [`AuditSink`]; the read API goes through
//! [`AuditQuery`]. The pipeline core holds only a sink handle and never
//! reads back what it wrote.

use crate::audit::types::AuditEntry;
use crate::error::{Error, Result};
use crate::pipeline::types::{PaginatedResponse, Pagination};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Append-only write half of the audit trail
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry to the trail
    async fn append(&self, entry: AuditEntry) -> Result<()>;
}

/// Read half of the audit trail, used by the audit API
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// All entries for one transaction, in timestamp then stage order
    async fn entries_for_transaction(&self, transaction_id: &str) -> Vec<AuditEntry>;

    /// Recent entries across all transactions, newest first
    async fn recent(&self, page: u64, per_page: u64) -> PaginatedResponse<AuditEntry>;
}

// =============================================================================
// JSONL sink
// =============================================================================

/// Audit sink backed by per-transaction JSONL files
pub struct JsonlAuditSink {
    dir: PathBuf,
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl JsonlAuditSink {
    /// Open the sink, creating the directory and loading existing trails
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let sink = Self {
            dir,
            entries: Arc::new(RwLock::new(Vec::new())),
        };

        sink.load_from_disk().await;
        Ok(sink)
    }

    fn trail_path(&self, transaction_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.jsonl", sanitize_transaction_id(transaction_id)))
    }

    /// Load all persisted entries from disk
    async fn load_from_disk(&self) {
        let loaded = load_jsonl_files(&self.dir);
        *self.entries.write().await = loaded;
    }

    async fn write_line(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.trail_path(&entry.transaction_id);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        self.write_line(&entry)
            .await
            .map_err(|e| Error::AuditWrite(e.to_string()))?;

        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }
}

#[async_trait]
impl AuditQuery for JsonlAuditSink {
    async fn entries_for_transaction(&self, transaction_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        query_transaction(&entries, transaction_id)
    }

    async fn recent(&self, page: u64, per_page: u64) -> PaginatedResponse<AuditEntry> {
        let entries = self.entries.read().await;
        query_recent(&entries, page, per_page)
    }
}

/// Keep transaction ids filesystem-safe; anything else becomes `_`
fn sanitize_transaction_id(transaction_id: &str) -> String {
    transaction_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load all JSONL trails from a directory, skipping unreadable lines
fn load_jsonl_files(dir: &Path) -> Vec<AuditEntry> {
    let mut entries = Vec::new();
    let dir_entries = match std::fs::read_dir(dir) {
        Ok(dir_entries) => dir_entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read audit directory {}: {}", dir.display(), e);
            }
            return entries;
        }
    };

    for file in dir_entries.flatten() {
        let path = file.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Skipping corrupt audit line in {}: {}", path.display(), e);
                }
            }
        }
    }

    entries
}

// =============================================================================
// Memory sink
// =============================================================================

/// Audit sink held entirely in memory, lost on restart
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }
}

#[async_trait]
impl AuditQuery for MemoryAuditSink {
    async fn entries_for_transaction(&self, transaction_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        query_transaction(&entries, transaction_id)
    }

    async fn recent(&self, page: u64, per_page: u64) -> PaginatedResponse<AuditEntry> {
        let entries = self.entries.read().await;
        query_recent(&entries, page, per_page)
    }
}

// =============================================================================
// Shared query logic
// =============================================================================

fn query_transaction(entries: &[AuditEntry], transaction_id: &str) -> Vec<AuditEntry> {
    let mut matched: Vec<AuditEntry> = entries
        .iter()
        .filter(|e| e.transaction_id == transaction_id)
        .cloned()
        .collect();
    // Detached writes land in arbitrary order and a clamped clock step ties
    // timestamps; the stage tiebreak keeps the trail in pipeline order.
    matched.sort_by_key(|e| (e.timestamp, e.stage));
    matched
}

fn query_recent(entries: &[AuditEntry], page: u64, per_page: u64) -> PaginatedResponse<AuditEntry> {
    let mut sorted: Vec<AuditEntry> = entries.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = sorted.len() as u64;
    let total_pages = if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    };

    let start = ((page - 1) * per_page) as usize;
    let data: Vec<AuditEntry> = sorted
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    PaginatedResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }
}
