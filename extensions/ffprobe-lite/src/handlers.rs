//! Media tool handlers

use std::time::Duration;

use dxt_common::{json_success, CallToolResult, Dispatcher, Tool};
use fs_sandbox::{Sandbox, SandboxError};

use crate::config::Config;
use crate::params::ProbeMediaRequest;
use crate::runner;
use crate::types::{
    CapabilitiesResponse, HealthResponse, LimitsSummary, MediaError, MediaInfoResponse,
    MediaResult, ToolSummary,
};

/// Streams returned per file
pub const MAX_STREAMS: usize = 4;

pub async fn health_check(dispatcher: &Dispatcher, config: &Config) -> MediaResult<CallToolResult> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: dispatcher.uptime().as_secs(),
        request_count: dispatcher.request_count(),
        ffprobe: runner::locate(&config.ffprobe.binary).is_some(),
    };

    Ok(json_success(&response)?)
}

pub async fn capabilities(config: &Config, tools: Vec<Tool>) -> MediaResult<CallToolResult> {
    let tools = tools
        .into_iter()
        .map(|tool| ToolSummary {
            name: tool.name.to_string(),
            description: tool
                .description
                .map(|d| d.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let response = CapabilitiesResponse {
        tools,
        limits: LimitsSummary {
            timeout_secs: config.ffprobe.timeout_secs,
            max_streams: MAX_STREAMS,
            rate_limit_per_minute: config.limits.rate_limit_per_minute,
            allowed_directories: config.paths.allowed.clone(),
        },
    };

    Ok(json_success(&response)?)
}

pub async fn probe_media(
    sandbox: &Sandbox,
    config: &Config,
    req: ProbeMediaRequest,
) -> MediaResult<CallToolResult> {
    let resolved = sandbox.resolve(&req.path)?;

    let metadata = tokio::fs::metadata(resolved.as_path())
        .await
        .map_err(|e| SandboxError::from_io(e, resolved.requested()))?;
    if !metadata.is_file() {
        return Err(SandboxError::invalid("path", "not a regular file").into());
    }

    let binary = runner::locate(&config.ffprobe.binary).ok_or(MediaError::FfprobeNotFound)?;
    let timeout = Duration::from_secs(config.ffprobe.timeout_secs);
    let report = runner::run(&binary, resolved.as_path(), timeout).await?;

    let stream_count = report.streams.len();
    let response = MediaInfoResponse {
        path: req.path,
        format: report.format,
        streams: report.streams.into_iter().take(MAX_STREAMS).collect(),
        stream_count,
    };

    Ok(json_success(&response)?)
}
