//! Prompt composer handlers

use dxt_common::{json_success, CallToolResult, Dispatcher, Tool};

use crate::compose::compose;
use crate::config::Config;
use crate::params::{ComposePromptRequest, DeleteBlockRequest, ListBlocksRequest, SaveBlockRequest};
use crate::store::BlockStore;
use crate::types::{
    BlockSummary, CapabilitiesResponse, ComposeResponse, ComposerError, ComposerResult,
    DeleteBlockResponse, HealthResponse, LimitsSummary, ListBlocksResponse, SaveBlockResponse,
    ToolSummary,
};

pub async fn health_check(
    dispatcher: &Dispatcher,
    store: &BlockStore,
) -> ComposerResult<CallToolResult> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: dispatcher.uptime().as_secs(),
        request_count: dispatcher.request_count(),
        block_count: store.len().await,
    };

    Ok(json_success(&response)?)
}

pub async fn capabilities(config: &Config, tools: Vec<Tool>) -> ComposerResult<CallToolResult> {
    let response = CapabilitiesResponse {
        tools: tools
            .into_iter()
            .map(|tool| ToolSummary {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            })
            .collect(),
        limits: LimitsSummary {
            max_blocks: config.limits.max_blocks,
            max_prompt_bytes: config.limits.max_prompt_bytes,
            rate_limit_per_minute: config.limits.rate_limit_per_minute,
        },
    };

    Ok(json_success(&response)?)
}

pub async fn save_block(
    store: &BlockStore,
    request: SaveBlockRequest,
) -> ComposerResult<CallToolResult> {
    let name = request.name.clone();
    let created = store
        .save(request.name, request.content, request.tags)
        .await?;

    Ok(json_success(&SaveBlockResponse { name, created })?)
}

pub async fn list_blocks(
    store: &BlockStore,
    request: ListBlocksRequest,
) -> ComposerResult<CallToolResult> {
    let blocks: Vec<BlockSummary> = store
        .list(request.tag.as_deref())
        .await
        .into_iter()
        .map(|b| BlockSummary {
            size: b.content.len(),
            name: b.name,
            tags: b.tags,
            updated_at: b.updated_at,
        })
        .collect();

    let response = ListBlocksResponse {
        total_count: blocks.len(),
        blocks,
    };

    Ok(json_success(&response)?)
}

pub async fn delete_block(
    store: &BlockStore,
    request: DeleteBlockRequest,
) -> ComposerResult<CallToolResult> {
    if !store.remove(&request.name).await {
        return Err(ComposerError::BlockNotFound(request.name));
    }

    Ok(json_success(&DeleteBlockResponse {
        name: request.name,
        deleted: true,
    })?)
}

pub async fn compose_prompt(
    store: &BlockStore,
    config: &Config,
    request: ComposePromptRequest,
) -> ComposerResult<CallToolResult> {
    let blocks = store.get_many(&request.blocks).await?;
    let composition = compose(
        &blocks,
        &request.separator,
        &request.variables,
        config.limits.max_prompt_bytes,
    )?;

    let response = ComposeResponse {
        prompt: composition.prompt,
        blocks_used: blocks.len(),
        unresolved: composition.unresolved,
    };

    Ok(json_success(&response)?)
}
