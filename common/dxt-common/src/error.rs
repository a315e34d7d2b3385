//! Protocol-level error helpers
//!
//! Tool failures (sandbox violations, rate limits, bad input) never surface as
//! protocol errors: the [`Dispatcher`](crate::Dispatcher) turns them into
//! `is_error` tool results. What remains here covers the rare failures that
//! belong to the MCP layer itself, such as a response that cannot be
//! serialized.

use rmcp::ErrorData as McpError;

/// Type alias for MCP tool results
pub type McpResult<T> = Result<T, McpError>;

/// Trait for converting errors into MCP-compatible errors
pub trait IntoMcpError {
    /// Convert this error into an MCP error
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for std::io::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("IO error: {}", self), None)
    }
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

/// Extension trait for Result types to convert to MCP errors
///
/// ```rust,ignore
/// use dxt_common::ResultExt;
///
/// let json = serde_json::to_string_pretty(&data).to_mcp_err()?;
/// ```
pub trait ResultExt<T> {
    /// Convert the error to an MCP error
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(|e| e.into_mcp_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_io() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.to_mcp_err().unwrap_err();
        assert!(err.message.contains("IO error"));
    }

    #[test]
    fn test_result_ext_json() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err = result.to_mcp_err().unwrap_err();
        assert!(err.message.contains("JSON error"));
    }
}
