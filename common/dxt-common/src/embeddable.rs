//! Embeddable MCP trait for in-process execution
//!
//! Lets a host (or a test) drive an extension server directly, without a
//! stdio transport in between. Calls go through the same dispatch pipeline
//! as calls arriving over MCP, so they are validated, rate-limited and
//! audited identically.
//!
//! ```rust,ignore
//! use dxt_common::{AuditLog, EmbeddableMcp};
//!
//! let server = FsSandboxServer::with_config(config, AuditLog::stderr())?;
//! let result = server
//!     .call_tool("default", "read_file", serde_json::json!({ "path": "~/notes.txt" }))
//!     .await;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Trait for MCP servers that can be executed in-process
///
/// Implementations must be `Send + Sync` to support concurrent tool calls
/// from multiple async tasks.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Returns the server name for identification
    fn server_name(&self) -> &str;

    /// Returns a list of all available tools
    fn list_tools(&self) -> Vec<Tool>;

    /// Executes a tool by name on behalf of `client_id`
    ///
    /// Never fails at this level: unknown tools, malformed arguments and
    /// handler failures all come back as an `is_error` result.
    async fn call_tool(&self, client_id: &str, name: &str, params: Value) -> CallToolResult;

    /// Returns an optional description of the server
    fn server_description(&self) -> Option<&str> {
        None
    }

    /// Returns the server version, if available
    fn server_version(&self) -> Option<&str> {
        None
    }
}
