//! MCP Server implementation for the prompt composer
//!
//! Calls arriving over MCP are routed by name through
//! [`PromptComposerServer::dispatch`], the same path in-process callers use.

use std::sync::Arc;

use dxt_common::{
    async_trait, AuditLog, Dispatcher, EmbeddableMcp, McpError, McpResult, RateLimitConfig,
};
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
use crate::store::BlockStore;
use crate::types::{ComposerError, ComposerResult};

const DESCRIPTION: &str = "Prompt composer extension. Save named text blocks, then compose \
    them in order into a single prompt with {{placeholder}} substitution. Blocks live in \
    memory for the lifetime of the server.";

/// The prompt-composer MCP Server
#[derive(Clone)]
pub struct PromptComposerServer {
    store: BlockStore,
    config: Arc<Config>,
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PromptComposerServer {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::load()?;
        tracing::info!(
            max_blocks = config.limits.max_blocks,
            max_prompt_bytes = config.limits.max_prompt_bytes,
            rate_limit = config.limits.rate_limit_per_minute,
            "Configuration loaded"
        );
        Ok(Self::with_config(config, AuditLog::stderr()))
    }

    pub fn with_config(config: Config, audit: AuditLog) -> Self {
        let limits = RateLimitConfig::per_minute(config.limits.rate_limit_per_minute);
        Self {
            store: BlockStore::new(config.limits.max_blocks),
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
        request: ComposerResult<ToolRequest>,
    ) -> CallToolResult {
        self.dispatcher
            .execute(client_id, operation, None, request, |request| {
                self.handle(request)
            })
            .await
    }

    async fn handle(&self, request: ToolRequest) -> Result<CallToolResult, ComposerError> {
        match request {
            ToolRequest::HealthCheck => {
                handlers::health_check(&self.dispatcher, &self.store).await
            }
            ToolRequest::Capabilities => {
                handlers::capabilities(&self.config, self.tool_router.list_all()).await
            }
            ToolRequest::SaveBlock(req) => handlers::save_block(&self.store, req).await,
            ToolRequest::ListBlocks(req) => handlers::list_blocks(&self.store, req).await,
            ToolRequest::DeleteBlock(req) => handlers::delete_block(&self.store, req).await,
            ToolRequest::ComposePrompt(req) => {
                handlers::compose_prompt(&self.store, &self.config, req).await
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

    #[tool(description = "Save a named prompt block, replacing any block with the same name")]
    async fn save_block(
        &self,
        Parameters(params): Parameters<SaveBlockParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::SaveBlock.name(),
                params.validate().map(ToolRequest::SaveBlock),
            )
            .await)
    }

    #[tool(description = "List saved blocks, optionally filtered by tag")]
    async fn list_blocks(
        &self,
        Parameters(params): Parameters<ListBlocksParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::ListBlocks.name(),
                params.validate().map(ToolRequest::ListBlocks),
            )
            .await)
    }

    #[tool(description = "Delete a saved block")]
    async fn delete_block(
        &self,
        Parameters(params): Parameters<DeleteBlockParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::DeleteBlock.name(),
                params.validate().map(ToolRequest::DeleteBlock),
            )
            .await)
    }

    #[tool(
        description = "Join saved blocks in the given order and fill {{placeholders}} from variables. Unfilled placeholders are reported, not dropped."
    )]
    async fn compose_prompt(
        &self,
        Parameters(params): Parameters<ComposePromptParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .execute(
                self.client_id(),
                Operation::ComposePrompt.name(),
                params.validate().map(ToolRequest::ComposePrompt),
            )
            .await)
    }
}

impl rmcp::ServerHandler for PromptComposerServer {
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
impl EmbeddableMcp for PromptComposerServer {
    fn server_name(&self) -> &str {
        "prompt-composer"
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
