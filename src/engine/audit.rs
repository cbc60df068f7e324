// Flowferry Engine — fire-and-forget audit logging.
//
// Audit entries are human-readable operation summaries keyed by the platform
// username. Recording one must never block or fail the operation it
// describes, so entries travel over an unbounded channel to a background
// task that feeds the sink; sink failures are logged and dropped.

use async_trait::async_trait;
use log::warn;
use tokio::sync::mpsc;

/// One audit entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: String,
    pub message: String,
}

/// Destination for audit entries (hosted backend, file, test buffer).
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn append(&self, entry: &AuditEntry) -> Result<(), String>;
}

#[async_trait]
impl<S: AuditSink> AuditSink for std::sync::Arc<S> {
    async fn append(&self, entry: &AuditEntry) -> Result<(), String> {
        (**self).append(entry).await
    }
}

/// Sink that drops everything. Used when no audit backend is configured.
pub struct NoopSink;

#[async_trait]
impl AuditSink for NoopSink {
    async fn append(&self, _entry: &AuditEntry) -> Result<(), String> {
        Ok(())
    }
}

/// In-memory sink for tests.
pub struct MemorySink {
    entries: parking_lot::Mutex<Vec<AuditEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            entries: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), String> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}

/// Handle for recording audit entries. `record` enqueues and returns
/// immediately; delivery happens on a background task.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::UnboundedSender<AuditEntry>,
}

impl AuditLog {
    /// Spawn the dispatcher task on the current tokio runtime.
    pub fn spawn(sink: impl AuditSink) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEntry>();
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = sink.append(&entry).await {
                    warn!("[audit] Dropped entry for {}: {}", entry.user_id, e);
                }
            }
        });
        Self { tx }
    }

    /// Enqueue an entry. Never blocks, never fails the caller — if the
    /// dispatcher is gone the entry is silently dropped.
    pub fn record(&self, user_id: impl Into<String>, message: impl Into<String>) {
        let entry = AuditEntry {
            user_id: user_id.into(),
            message: message.into(),
        };
        if self.tx.send(entry).is_err() {
            warn!("[audit] Dispatcher gone, entry dropped");
        }
    }
}
