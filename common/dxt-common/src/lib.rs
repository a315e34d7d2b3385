//! DXT Common - Shared plumbing for desktop extension MCP servers
//!
//! This crate provides the pieces every extension server in the workspace
//! needs around its own tools:
//!
//! - **Initialization**: `serve_stdio!` macro for standardized server startup
//! - **Results**: Helper functions for creating `CallToolResult` responses
//! - **Errors**: Traits for converting errors to MCP-compatible format
//! - **Rate limiting**: [`RateLimiter`], a per-client sliding window counter
//! - **Auditing**: [`AuditLog`], one PII-free JSON line per tool call
//! - **Dispatch**: [`Dispatcher`], the validate → rate-limit → handle → audit pipeline
//! - **Embeddable**: [`EmbeddableMcp`] trait for in-process execution
//!
//! # Example
//!
//! ```rust,ignore
//! use dxt_common::serve_stdio;
//!
//! // In main.rs
//! serve_stdio!(MyServer, "my_extension");
//!
//! // In a tool implementation
//! async fn my_tool(&self, params: MyParams) -> CallToolResult {
//!     self.dispatcher
//!         .execute(&self.client_id, "my_tool", None, params.validate(), |req| handle(req))
//!         .await
//! }
//! ```

pub mod audit;
pub mod dispatch;
pub mod embeddable;
pub mod error;
pub mod init;
pub mod rate_limit;
pub mod result;

// Re-export commonly used items at crate root
pub use audit::{path_digest, AuditDetails, AuditLog, AuditRecord, MemorySink, Outcome};
pub use dispatch::{Dispatcher, ToolError};
pub use embeddable::EmbeddableMcp;
pub use error::{IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use rate_limit::{RateLimitConfig, RateLimitExceeded, RateLimiter};
pub use result::{error_result, json_success, result_text, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
