//! Type definitions for the prompt composer

use chrono::{DateTime, Utc};
use dxt_common::{RateLimitExceeded, ToolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named, reusable piece of prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub content: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub request_count: u64,
    pub block_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimitsSummary {
    pub max_blocks: usize,
    pub max_prompt_bytes: usize,
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub tools: Vec<ToolSummary>,
    pub limits: LimitsSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveBlockResponse {
    pub name: String,
    /// false when an existing block was replaced
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockSummary {
    pub name: String,
    pub tags: Vec<String>,
    pub size: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBlocksResponse {
    pub blocks: Vec<BlockSummary>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteBlockResponse {
    pub name: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub prompt: String,
    pub blocks_used: usize,
    pub unresolved: Vec<String>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Block store is full ({max} blocks)")]
    StoreFull { max: usize },

    #[error("Composed prompt too large: {size} bytes (max: {max})")]
    OutputTooLarge { size: usize, max: usize },

    #[error("{0}. Try again later.")]
    RateLimitExceeded(#[from] RateLimitExceeded),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ComposerError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl ToolError for ComposerError {
    fn code(&self) -> &'static str {
        match self {
            Self::BlockNotFound(_) => "BLOCK_NOT_FOUND",
            Self::StoreFull { .. } => "STORE_FULL",
            Self::OutputTooLarge { .. } => "OUTPUT_TOO_LARGE",
            Self::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<dxt_common::McpError> for ComposerError {
    fn from(err: dxt_common::McpError) -> Self {
        Self::Internal(err.message.to_string())
    }
}

pub type ComposerResult<T> = Result<T, ComposerError>;
