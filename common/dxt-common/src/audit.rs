//! Audit trail for tool calls
//!
//! Every dispatched call produces exactly one [`AuditRecord`], written as a
//! single JSON line to the audit sink (stderr by default, never stdout, which
//! carries the MCP protocol). Records carry no file content and no paths:
//! a path is represented only by a truncated SHA-256 digest.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 digest kept in a record
const PATH_HASH_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_hash: Option<String>,
}

impl AuditDetails {
    fn is_empty(&self) -> bool {
        self.error_code.is_none() && self.path_hash.is_none()
    }
}

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub request_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<AuditDetails>,
}

/// Non-reversible, truncated digest of a path
pub fn path_digest(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(PATH_HASH_LEN);
    hex
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Emits audit records to a line-oriented sink
#[derive(Clone)]
pub struct AuditLog {
    sink: Sink,
    counter: Arc<AtomicU64>,
}

impl AuditLog {
    /// Audit log writing to the process error stream
    pub fn stderr() -> Self {
        Self::with_writer(std::io::stderr())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of records emitted so far
    pub fn request_count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Build and emit the record for one finished call
    pub fn record(
        &self,
        tool: &str,
        outcome: Outcome,
        duration: Duration,
        path: Option<&str>,
        error_code: Option<&str>,
    ) {
        let details = AuditDetails {
            error_code: error_code.map(str::to_string),
            path_hash: path.map(path_digest),
        };

        let record = AuditRecord {
            timestamp: Utc::now(),
            tool: tool.to_string(),
            outcome,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            request_number: self.counter.fetch_add(1, Ordering::Relaxed) + 1,
            details: (!details.is_empty()).then_some(details),
        };

        self.emit(&record);
    }

    fn emit(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize audit record");
                return;
            }
        };

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
            tracing::warn!(error = %e, tool = %record.tool, "failed to write audit record");
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}

/// In-memory audit sink for embedding hosts and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Parsed records, skipping any line that is not a record
    pub fn records(&self) -> Vec<AuditRecord> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
