//! Parameter types for fs-sandbox tools
//!
//! `*Params` are the wire shapes (deserialized by the MCP SDK, described by
//! JSON Schema). Each converts into a validated `*Request` via `validate`,
//! which is the only way handlers receive their input.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sandbox::validate_path_string;
use crate::types::{SandboxError, SandboxResult};

/// Largest `content` string accepted by write_file, in bytes
pub const MAX_CONTENT_LEN: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Base64,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Base64 => "base64",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    #[schemars(description = "Path of the file to read, inside an allowed directory")]
    pub path: String,

    #[schemars(description = "How to return the content: utf8 (default) or base64")]
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    #[schemars(description = "Path of the file to write, inside an allowed directory")]
    pub path: String,

    #[schemars(description = "Content to write")]
    pub content: String,

    #[schemars(description = "How content is encoded: utf8 (default) or base64")]
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListDirectoryParams {
    #[schemars(description = "Directory path to list")]
    pub path: String,

    #[schemars(description = "Optional glob pattern matched against entry names (e.g. '*.md')")]
    #[serde(default)]
    pub pattern: Option<String>,
}

// ============================================================================
// Validated requests
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReadFileRequest {
    pub path: String,
    pub encoding: Encoding,
}

#[derive(Debug, Clone)]
pub struct WriteFileRequest {
    pub path: String,
    /// Decoded bytes to store
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ListDirectoryRequest {
    pub path: String,
    pub pattern: Option<glob::Pattern>,
}

impl ReadFileParams {
    pub fn validate(self) -> SandboxResult<ReadFileRequest> {
        validate_path_string(&self.path)?;
        Ok(ReadFileRequest {
            path: self.path,
            encoding: self.encoding.unwrap_or_default(),
        })
    }
}

impl WriteFileParams {
    pub fn validate(self) -> SandboxResult<WriteFileRequest> {
        validate_path_string(&self.path)?;
        if self.content.len() > MAX_CONTENT_LEN {
            return Err(SandboxError::invalid(
                "content",
                format!("longer than {} bytes", MAX_CONTENT_LEN),
            ));
        }

        let content = match self.encoding.unwrap_or_default() {
            Encoding::Utf8 => self.content.into_bytes(),
            Encoding::Base64 => STANDARD
                .decode(self.content.trim())
                .map_err(|e| SandboxError::invalid("content", format!("invalid base64: {}", e)))?,
        };

        Ok(WriteFileRequest {
            path: self.path,
            content,
        })
    }
}

impl ListDirectoryParams {
    pub fn validate(self) -> SandboxResult<ListDirectoryRequest> {
        validate_path_string(&self.path)?;
        let pattern = self
            .pattern
            .filter(|p| !p.is_empty())
            .map(|p| glob::Pattern::new(&p))
            .transpose()
            .map_err(|e| SandboxError::invalid("pattern", e.to_string()))?;

        Ok(ListDirectoryRequest {
            path: self.path,
            pattern,
        })
    }
}

// ============================================================================
// Operation registry
// ============================================================================

/// The fixed set of tools this server dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    HealthCheck,
    Capabilities,
    ReadFile,
    WriteFile,
    ListDirectory,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::HealthCheck,
        Operation::Capabilities,
        Operation::ReadFile,
        Operation::WriteFile,
        Operation::ListDirectory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::HealthCheck => "health_check",
            Operation::Capabilities => "capabilities",
            Operation::ReadFile => "read_file",
            Operation::WriteFile => "write_file",
            Operation::ListDirectory => "list_directory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// A validated call, ready for rate limiting and execution
#[derive(Debug, Clone)]
pub enum ToolRequest {
    HealthCheck,
    Capabilities,
    ReadFile(ReadFileRequest),
    WriteFile(WriteFileRequest),
    ListDirectory(ListDirectoryRequest),
}

impl ToolRequest {
    /// Look up `name` and validate `args` against its parameter shape
    pub fn parse(name: &str, args: Value) -> SandboxResult<Self> {
        let op = Operation::from_name(name)
            .ok_or_else(|| SandboxError::UnknownOperation(name.to_string()))?;

        match op {
            Operation::HealthCheck => Ok(ToolRequest::HealthCheck),
            Operation::Capabilities => Ok(ToolRequest::Capabilities),
            Operation::ReadFile => from_args::<ReadFileParams>(args)?
                .validate()
                .map(ToolRequest::ReadFile),
            Operation::WriteFile => from_args::<WriteFileParams>(args)?
                .validate()
                .map(ToolRequest::WriteFile),
            Operation::ListDirectory => from_args::<ListDirectoryParams>(args)?
                .validate()
                .map(ToolRequest::ListDirectory),
        }
    }

    /// Caller-supplied path the request concerns, for auditing
    pub fn path(&self) -> Option<&str> {
        match self {
            ToolRequest::HealthCheck | ToolRequest::Capabilities => None,
            ToolRequest::ReadFile(r) => Some(&r.path),
            ToolRequest::WriteFile(r) => Some(&r.path),
            ToolRequest::ListDirectory(r) => Some(&r.path),
        }
    }
}

fn from_args<T: serde::de::DeserializeOwned>(args: Value) -> SandboxResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| SandboxError::invalid("arguments", e.to_string()))
}
