//! Filesystem operation handlers
//!
//! Each handler takes the sandbox, config, and a validated request. Rate
//! limiting and auditing happen around them in the dispatcher.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dxt_common::{json_success, CallToolResult, Dispatcher, Tool};
use tokio::fs;

use crate::capped::{read_capped, write_capped};
use crate::config::Config;
use crate::params::{Encoding, ListDirectoryRequest, ReadFileRequest, WriteFileRequest};
use crate::prompts;
use crate::sandbox::Sandbox;
use crate::types::{
    CapabilitiesResponse, DirEntry, HealthResponse, LimitsSummary, ListDirectoryResponse,
    PromptArgument, PromptSummary, ReadFileResponse, SandboxError, SandboxResult, ToolSummary,
    WriteFileResponse,
};

pub async fn health_check(dispatcher: &Dispatcher) -> SandboxResult<CallToolResult> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: dispatcher.uptime().as_secs(),
        request_count: dispatcher.request_count(),
    };

    Ok(json_success(&response)?)
}

pub async fn capabilities(config: &Config, tools: Vec<Tool>) -> SandboxResult<CallToolResult> {
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

    let prompts = prompts::list()
        .into_iter()
        .map(|prompt| PromptSummary {
            name: prompt.name,
            description: prompt.description.unwrap_or_default(),
            arguments: prompt
                .arguments
                .unwrap_or_default()
                .into_iter()
                .map(|arg| PromptArgument {
                    name: arg.name,
                    description: arg.description.unwrap_or_default(),
                    required: arg.required.unwrap_or(false),
                })
                .collect(),
        })
        .collect();

    let response = CapabilitiesResponse {
        tools,
        prompts,
        limits: LimitsSummary {
            max_file_size: config.limits.max_file_size,
            rate_limit_per_minute: config.limits.rate_limit_per_minute,
            allowed_directories: config.paths.allowed.clone(),
        },
    };

    Ok(json_success(&response)?)
}

pub async fn read_file(
    sandbox: &Sandbox,
    config: &Config,
    request: ReadFileRequest,
) -> SandboxResult<CallToolResult> {
    let resolved = sandbox.resolve(&request.path)?;
    let data = read_capped(&resolved, config.limits.max_file_size).await?;

    let content = match request.encoding {
        Encoding::Utf8 => String::from_utf8_lossy(&data).into_owned(),
        Encoding::Base64 => STANDARD.encode(&data),
    };

    let response = ReadFileResponse {
        path: request.path,
        size: data.len() as u64,
        encoding: request.encoding.as_str().to_string(),
        content,
    };

    Ok(json_success(&response)?)
}

pub async fn write_file(
    sandbox: &Sandbox,
    config: &Config,
    request: WriteFileRequest,
) -> SandboxResult<CallToolResult> {
    let resolved = sandbox.resolve(&request.path)?;
    let bytes_written =
        write_capped(&resolved, &request.content, config.limits.max_file_size).await?;

    let response = WriteFileResponse {
        path: request.path,
        bytes_written,
    };

    Ok(json_success(&response)?)
}

pub async fn list_directory(
    sandbox: &Sandbox,
    config: &Config,
    request: ListDirectoryRequest,
) -> SandboxResult<CallToolResult> {
    let resolved = sandbox.resolve(&request.path)?;

    let metadata = fs::metadata(resolved.as_path())
        .await
        .map_err(|e| SandboxError::from_io(e, &request.path))?;
    if !metadata.is_dir() {
        return Err(SandboxError::invalid(
            "path",
            format!("not a directory: {}", request.path),
        ));
    }

    let mut read_dir = fs::read_dir(resolved.as_path())
        .await
        .map_err(|e| SandboxError::from_io(e, &request.path))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| SandboxError::from_io(e, &request.path))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(pattern) = &request.pattern {
            if !pattern.matches(&name) {
                continue;
            }
        }

        // An entry may vanish between listing and inspection
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };

        entries.push(DirEntry {
            name,
            entry_type: if file_type.is_dir() {
                "directory".to_string()
            } else {
                "file".to_string()
            },
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let truncated = entries.len() > config.limits.max_list_entries;
    entries.truncate(config.limits.max_list_entries);

    let response = ListDirectoryResponse {
        path: request.path,
        entries,
        truncated,
    };

    Ok(json_success(&response)?)
}
