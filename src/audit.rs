//! Session audit log
//!
//! Appends one JSON line per session event so connection history can be
//! reviewed after the fact. Logging never fails an operation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Kind of session event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    ConnectStart,
    ConnectComplete,
    ConnectSuperseded,
    Disconnect,
}

/// Entry in the audit log
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
    pub provider: Option<String>,
    pub generation: u64,
    pub address: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub status: &'static str,
}

impl AuditEntry {
    pub fn new(event: SessionEvent, generation: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            provider: None,
            generation,
            address: None,
            error: None,
            duration_ms: 0,
            status: "ok",
        }
    }
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// JSONL audit trail shared by clones of a session
#[derive(Clone)]
pub struct SessionAuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl SessionAuditLog {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter {
                path: log_path.into(),
            })),
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

impl std::fmt::Debug for SessionAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuditLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let temp_file = NamedTempFile::new().unwrap();
        let log = SessionAuditLog::new(temp_file.path());

        log.record(AuditEntry::new(SessionEvent::ConnectStart, 1)).await;
        log.record(AuditEntry {
            address: Some("GABC".to_string()),
            duration_ms: 12,
            ..AuditEntry::new(SessionEvent::ConnectComplete, 1)
        })
        .await;

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "connect_start");
        assert_eq!(lines[1]["event"], "connect_complete");
        assert_eq!(lines[1]["address"], "GABC");
        assert_eq!(lines[1]["duration_ms"], 12);
    }

    #[tokio::test]
    async fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let log = SessionAuditLog::new(dir.path());
        log.record(AuditEntry::new(SessionEvent::Disconnect, 0)).await;
    }
}
