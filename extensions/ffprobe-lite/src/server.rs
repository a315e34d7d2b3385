//! MCP Server implementation for ffprobe-lite
//!
//! Same shape as fs-sandbox: the router describes the tools, and every call
//! goes through [`FfprobeLiteServer::dispatch`].

use std::sync::Arc;

use dxt_common::{
    async_trait, AuditLog, Dispatcher, EmbeddableMcp, McpError, McpResult, RateLimitConfig,
};
use fs_sandbox::{Sandbox, SandboxResult};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    tool, tool_router, RoleServer,
};
use serde_json::Value;

use crate::config::Config;
use crate::handlers;
use crate::params::*;
use crate::types::{MediaError, MediaResult};

const DESCRIPTION: &str = "Media metadata extension. Runs ffprobe on files inside the \
    configured allowed directories and returns the container format and the first streams.";

/// The ffprobe-lite MCP Server
#[derive(Clone)]
pub struct FfprobeLiteServer {
    sandbox: Sandbox,
    config: Arc<Config>,
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FfprobeLiteServer {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::load()?;
        tracing::info!(
            allowed_dirs = config.paths.allowed.len(),
            timeout_secs = config.ffprobe.timeout_secs,
            rate_limit = config.limits.rate_limit_per_minute,
            "Configuration loaded"
        );
        Ok(Self::with_config(config, AuditLog::stderr())?)
    }

    pub fn with_config(config: Config, audit: AuditLog) -> SandboxResult<Self> {
        let sandbox = Sandbox::new(&config.paths.allowed)?;
        Ok(Self::with_sandbox(sandbox, config, audit))
    }

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
        request: MediaResult<ToolRequest>,
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

    async fn handle(&self, request: ToolRequest) -> Result<CallToolResult, MediaError> {
        match request {
            ToolRequest::HealthCheck => {
                handlers::health_check(&self.dispatcher, &self.config).await
            }
            ToolRequest::Capabilities => {
                handlers::capabilities(&self.config, self.tool_router.list_all()).await
            }
            ToolRequest::ProbeMedia(req) => {
                handlers::probe_media(&self.sandbox, &self.config, req).await
            }
        }
    }

    fn client_id(&self) -> &str {
        &self.config.client.id
    }

    #[tool(description = "Check server health and whether ffprobe is available")]
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
        description = "Read container format and up to four streams of a media file within the allowed directories"
    )]
    async fn probe_media(
        &self,
        Parameters(params): Parameters<ProbeMediaParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::ProbeMedia.name(),
                params.validate().map(ToolRequest::ProbeMedia),
            )
            .await)
    }
}

impl rmcp::ServerHandler for FfprobeLiteServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(DESCRIPTION.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
}

#[async_trait]
impl EmbeddableMcp for FfprobeLiteServer {
    fn server_name(&self) -> &str {
        "ffprobe-lite"
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
    use dxt_common::{result_text, MemorySink};
    use serde_json::json;

    fn server(binary: &str) -> (FfprobeLiteServer, MemorySink) {
        let mut config = Config::default();
        config.ffprobe.binary = binary.to_string();

        let sink = MemorySink::new();
        let sandbox = Sandbox::with_dirs(&[], None, std::env::temp_dir()).unwrap();
        let server =
            FfprobeLiteServer::with_sandbox(sandbox, config, AuditLog::with_writer(sink.clone()));
        (server, sink)
    }

    #[test]
    fn test_list_tools() {
        let (server, _) = server("ffprobe");
        let mut names: Vec<String> = server
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["capabilities", "health_check", "probe_media"]);
    }

    #[tokio::test]
    async fn test_health_reports_missing_ffprobe() {
        let (server, _) = server("/nonexistent/ffprobe");
        let result = server.call_tool("c", "health_check", json!({})).await;
        let body: Value = serde_json::from_str(&result_text(&result)).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ffprobe"], false);
    }

    #[tokio::test]
    async fn test_typed_tool_method_is_audited() {
        let (server, sink) = server("ffprobe");
        let result = server
            .probe_media(Parameters(ProbeMediaParams {
                path: "/etc/passwd".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].details.as_ref().and_then(|d| d.error_code.as_deref()),
            Some("SANDBOX_VIOLATION")
        );
        assert_eq!(server.dispatcher().limiter().window_len("default"), 1);
    }
}
