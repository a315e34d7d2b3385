//! Type definitions for ffprobe-lite

use dxt_common::{RateLimitExceeded, ToolError};
use fs_sandbox::SandboxError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub request_count: u64,
    /// Whether the ffprobe executable can be found
    pub ffprobe: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimitsSummary {
    pub timeout_secs: u64,
    pub max_streams: usize,
    pub rate_limit_per_minute: u32,
    pub allowed_directories: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub tools: Vec<ToolSummary>,
    pub limits: LimitsSummary,
}

/// Response for probe_media
///
/// `streams` holds at most the first few streams; `stream_count` is the
/// total ffprobe reported.
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaInfoResponse {
    pub path: String,
    pub format: Map<String, Value>,
    pub streams: Vec<Value>,
    pub stream_count: usize,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum MediaError {
    /// Path, input and rate-limit failures shared with fs-sandbox
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,

    #[error("ffprobe timed out after {0} s")]
    Timeout(u64),

    #[error("ffprobe failed: {0}")]
    Failed(String),

    #[error("ffprobe returned unreadable output: {0}")]
    InvalidOutput(String),
}

impl From<RateLimitExceeded> for MediaError {
    fn from(err: RateLimitExceeded) -> Self {
        Self::Sandbox(SandboxError::from(err))
    }
}

impl From<dxt_common::McpError> for MediaError {
    fn from(err: dxt_common::McpError) -> Self {
        Self::Sandbox(SandboxError::from(err))
    }
}

impl ToolError for MediaError {
    fn code(&self) -> &'static str {
        match self {
            Self::Sandbox(err) => err.code(),
            Self::FfprobeNotFound => "FFPROBE_NOT_FOUND",
            Self::Timeout(_) => "FFPROBE_TIMEOUT",
            Self::Failed(_) => "FFPROBE_FAILED",
            Self::InvalidOutput(_) => "INVALID_OUTPUT",
        }
    }
}

pub type MediaResult<T> = Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_errors_keep_their_code() {
        let err = MediaError::from(SandboxError::SandboxViolation("/etc/passwd".into()));
        assert_eq!(err.code(), "SANDBOX_VIOLATION");
        assert_eq!(
            err.to_string(),
            "Path not within allowed directories: /etc/passwd"
        );
    }

    #[test]
    fn test_rate_limit_code() {
        let err = MediaError::from(RateLimitExceeded {
            quota: 1,
            window_ms: 60_000,
        });
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
    }
}
