//! MCP Server implementation for sandboxed filesystem operations
//!
//! This module defines the server that exposes the sandbox as tools.
//! Every tool call, whether it arrives over MCP or in-process, goes through
//! [`FsSandboxServer::dispatch`]: validate, rate-limit, handle, audit. The
//! tool router only describes the tools; it never routes a call, so unknown
//! names and malformed arguments are audited like any other failure.

use std::sync::Arc;

use dxt_common::{
    async_trait, AuditLog, Dispatcher, EmbeddableMcp, McpError, McpResult, RateLimitConfig,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
        ListPromptsResult, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
        ServerInfo, Tool,
    },
    service::RequestContext,
    tool, tool_router, RoleServer,
};
use serde_json::Value;

use crate::config::Config;
use crate::handlers;
use crate::params::*;
use crate::prompts;
use crate::sandbox::Sandbox;
use crate::types::{SandboxError, SandboxResult};

const DESCRIPTION: &str = "Sandboxed filesystem extension. Reads and writes are restricted \
    to the configured allowed directories and capped in size; calls are rate-limited per client. \
    Use capabilities to see the limits in effect.";

/// The fs-sandbox MCP Server
#[derive(Clone)]
pub struct FsSandboxServer {
    sandbox: Sandbox,
    config: Arc<Config>,
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Tool metadata and typed entry points
// ============================================================================

#[tool_router]
impl FsSandboxServer {
    /// Create a server from the config file and environment
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::load()?;
        tracing::info!(
            allowed_dirs = config.paths.allowed.len(),
            max_file_size = config.limits.max_file_size,
            rate_limit = config.limits.rate_limit_per_minute,
            "Configuration loaded"
        );
        Ok(Self::with_config(config, AuditLog::stderr())?)
    }

    /// Create a server with explicit config and audit sink
    pub fn with_config(config: Config, audit: AuditLog) -> SandboxResult<Self> {
        let sandbox = Sandbox::new(&config.paths.allowed)?;
        Ok(Self::with_sandbox(sandbox, config, audit))
    }

    /// Create a server around a pre-built sandbox
    pub fn with_sandbox(sandbox: Sandbox, config: Config, audit: AuditLog) -> Self {
        let limits = RateLimitConfig::per_minute(config.limits.rate_limit_per_minute);
        Self {
            sandbox,
            config: Arc::new(config),
            dispatcher: Dispatcher::new(limits, audit),
            tool_router: Self::tool_router(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch a call by name with raw JSON arguments
    pub async fn dispatch(&self, client_id: &str, name: &str, args: Value) -> CallToolResult {
        self.execute(client_id, name, ToolRequest::parse(name, args))
            .await
    }

    async fn execute(
        &self,
        client_id: &str,
        operation: &str,
        request: SandboxResult<ToolRequest>,
    ) -> CallToolResult {
        let path = request
            .as_ref()
            .ok()
            .and_then(ToolRequest::path)
            .map(str::to_owned);

        self.dispatcher
            .execute(client_id, operation, path.as_deref(), request, |request| {
                self.handle(request)
            })
            .await
    }

    async fn handle(&self, request: ToolRequest) -> Result<CallToolResult, SandboxError> {
        match request {
            ToolRequest::HealthCheck => handlers::health_check(&self.dispatcher).await,
            ToolRequest::Capabilities => {
                handlers::capabilities(&self.config, self.tool_router.list_all()).await
            }
            ToolRequest::ReadFile(req) => {
                handlers::read_file(&self.sandbox, &self.config, req).await
            }
            ToolRequest::WriteFile(req) => {
                handlers::write_file(&self.sandbox, &self.config, req).await
            }
            ToolRequest::ListDirectory(req) => {
                handlers::list_directory(&self.sandbox, &self.config, req).await
            }
        }
    }

    fn client_id(&self) -> &str {
        &self.config.client.id
    }

    #[tool(description = "Check server health and status")]
    async fn health_check(&self) -> McpResult<CallToolResult> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::HealthCheck.name(),
                Ok(ToolRequest::HealthCheck),
            )
            .await)
    }

    #[tool(description = "List server capabilities and limits")]
    async fn capabilities(&self) -> McpResult<CallToolResult> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::Capabilities.name(),
                Ok(ToolRequest::Capabilities),
            )
            .await)
    }

    #[tool(
        description = "Read a file within the allowed directories. Files larger than the configured limit are refused."
    )]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::ReadFile.name(),
                params.validate().map(ToolRequest::ReadFile),
            )
            .await)
    }

    #[tool(
        description = "Write a file within the allowed directories, creating parent directories as needed."
    )]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::WriteFile.name(),
                params.validate().map(ToolRequest::WriteFile),
            )
            .await)
    }

    #[tool(description = "List the contents of a directory within the allowed directories")]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<ListDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::ListDirectory.name(),
                params.validate().map(ToolRequest::ListDirectory),
            )
            .await)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

impl rmcp::ServerHandler for FsSandboxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(DESCRIPTION.into()),
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        Ok(self.dispatch(self.client_id(), &request.name, args).await)
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompts::list()))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        prompts::get(&request.name, request.arguments.as_ref())
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for FsSandboxServer {
    fn server_name(&self) -> &str {
        "fs-sandbox"
    }

    fn server_description(&self) -> Option<&str> {
        Some(DESCRIPTION)
    }

    fn server_version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, client_id: &str, name: &str, params: Value) -> CallToolResult {
        self.dispatch(client_id, name, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxt_common::{result_text, MemorySink, Outcome};
    use serde_json::json;
    use tempfile::TempDir;

    fn server(dir: &TempDir, rate_limit: u32) -> (FsSandboxServer, MemorySink) {
        let mut config = Config::default();
        config.paths.allowed = vec![dir.path().display().to_string()];
        config.limits.rate_limit_per_minute = rate_limit;
        config.limits.max_file_size = 64;

        let sink = MemorySink::new();
        let server = FsSandboxServer::with_config(config, AuditLog::with_writer(sink.clone()))
            .unwrap();
        (server, sink)
    }

    #[test]
    fn test_list_tools() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir, 60);
        let tools = server.list_tools();

        let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        let mut expected: Vec<String> =
            Operation::ALL.iter().map(|op| op.name().to_string()).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir, 60);

        let result = server.call_tool("c", "health_check", json!({})).await;
        assert!(!result.is_error.unwrap_or(false));

        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["request_count"], 0);
    }

    #[tokio::test]
    async fn test_capabilities_lists_limits() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir, 7);

        let result = server.call_tool("c", "capabilities", json!({})).await;
        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();
        assert_eq!(body["limits"]["max_file_size"], 64);
        assert_eq!(body["limits"]["rate_limit_per_minute"], 7);
        assert_eq!(body["tools"].as_array().unwrap().len(), Operation::ALL.len());
        assert_eq!(body["prompts"][0]["name"], "analyze_file");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_audited() {
        let dir = TempDir::new().unwrap();
        let (server, sink) = server(&dir, 60);

        let result = server.call_tool("c", "format_disk", json!({})).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Error: Unknown tool: format_disk");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Outcome::Error);
        assert_eq!(
            records[0].details.as_ref().and_then(|d| d.error_code.as_deref()),
            Some("UNKNOWN_OPERATION")
        );
    }

    #[tokio::test]
    async fn test_error_never_leaks_resolved_path() {
        let dir = TempDir::new().unwrap();
        let (server, sink) = server(&dir, 60);

        let result = server
            .call_tool("c", "read_file", json!({"path": "missing.txt"}))
            .await;
        assert_eq!(result.is_error, Some(true));

        let text = result_text(&result);
        let root = dir.path().display().to_string();
        assert!(text.contains("missing.txt"));
        assert!(!text.contains(&root));
        assert!(!sink.contents().contains("missing.txt"));
    }

    #[tokio::test]
    async fn test_rate_limit_applies_per_client() {
        let dir = TempDir::new().unwrap();
        let (server, sink) = server(&dir, 2);

        for _ in 0..2 {
            let ok = server.call_tool("a", "health_check", json!({})).await;
            assert!(!ok.is_error.unwrap_or(false));
        }
        let limited = server.call_tool("a", "health_check", json!({})).await;
        assert_eq!(limited.is_error, Some(true));
        assert!(result_text(&limited).contains("Rate limit exceeded"));
        assert_eq!(server.dispatcher().limiter().window_len("a"), 2);

        let other = server.call_tool("b", "health_check", json!({})).await;
        assert!(!other.is_error.unwrap_or(false));

        assert_eq!(sink.records().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_input_not_counted() {
        let dir = TempDir::new().unwrap();
        let (server, _) = server(&dir, 1);

        let bad = server.call_tool("a", "read_file", json!({"path": ""})).await;
        assert_eq!(bad.is_error, Some(true));
        assert!(result_text(&bad).contains("Invalid input: path"));
        assert_eq!(server.dispatcher().limiter().window_len("a"), 0);
    }

    #[tokio::test]
    async fn test_typed_tool_methods_share_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let (server, sink) = server(&dir, 60);
        std::fs::write(dir.path().join("a.txt"), "typed").unwrap();

        let result = server
            .read_file(Parameters(ReadFileParams {
                path: dir.path().join("a.txt").display().to_string(),
                encoding: None,
            }))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();
        assert_eq!(body["content"], "typed");

        let rejected = server
            .read_file(Parameters(ReadFileParams {
                path: "/etc/passwd".to_string(),
                encoding: None,
            }))
            .await
            .unwrap();
        assert_eq!(rejected.is_error, Some(true));

        assert_eq!(sink.records().len(), 2);
        assert_eq!(server.dispatcher().limiter().window_len("default"), 2);
    }
}
