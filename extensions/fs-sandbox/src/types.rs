//! Type definitions for the filesystem sandbox

use dxt_common::{RateLimitExceeded, ToolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Response Types
// ============================================================================

/// Response for health_check
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub request_count: u64,
}

/// Tool entry in the capabilities listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Argument of an advertised prompt
#[derive(Debug, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Prompt advertised in the capabilities listing
#[derive(Debug, Serialize, Deserialize)]
pub struct PromptSummary {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimitsSummary {
    pub max_file_size: u64,
    pub rate_limit_per_minute: u32,
    pub allowed_directories: Vec<String>,
}

/// Response for capabilities
#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub tools: Vec<ToolSummary>,
    pub prompts: Vec<PromptSummary>,
    pub limits: LimitsSummary,
}

/// Response for read_file
///
/// `path` echoes the caller's string, never the resolved location.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub path: String,
    pub size: u64,
    pub encoding: String,
    pub content: String,
}

/// Response for write_file
#[derive(Debug, Serialize, Deserialize)]
pub struct WriteFileResponse {
    pub path: String,
    pub bytes_written: u64,
}

/// Directory entry
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String, // "file" or "directory"
}

/// Response for list_directory
#[derive(Debug, Serialize, Deserialize)]
pub struct ListDirectoryResponse {
    pub path: String,
    pub entries: Vec<DirEntry>,
    pub truncated: bool,
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures of a sandboxed operation
///
/// Messages carry at most the caller-supplied path string, never the resolved
/// absolute path.
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Path not within allowed directories: {0}")]
    SandboxViolation(String),

    #[error("Path escapes allowed directories through a symbolic link: {0}")]
    SymlinkEscape(String),

    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("{0}. Try again later.")]
    RateLimitExceeded(#[from] RateLimitExceeded),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SandboxError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Classify a filesystem error for the path the caller asked about
    pub fn from_io(err: std::io::Error, requested: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(requested.to_string()),
            _ => Self::Io(err),
        }
    }
}

impl ToolError for SandboxError {
    fn code(&self) -> &'static str {
        match self {
            Self::SandboxViolation(_) => "SANDBOX_VIOLATION",
            Self::SymlinkEscape(_) => "SYMLINK_ESCAPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<dxt_common::McpError> for SandboxError {
    fn from(err: dxt_common::McpError) -> Self {
        Self::Internal(err.message.to_string())
    }
}

pub type SandboxResult<T> = Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_caller_path() {
        let err = SandboxError::from_io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "~/notes.txt",
        );
        assert!(matches!(err, SandboxError::NotFound(ref p) if p == "~/notes.txt"));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_other_io_errors_pass_through() {
        let err = SandboxError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "x",
        );
        assert_eq!(err.code(), "IO_ERROR");
        assert_eq!(err.to_string(), "IO error: denied");
    }

    #[test]
    fn test_rate_limit_message() {
        let err = SandboxError::from(RateLimitExceeded {
            quota: 60,
            window_ms: 60_000,
        });
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded (60 requests per 60000 ms). Try again later."
        );
    }
}
