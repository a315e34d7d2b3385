//! Parameter types for ffprobe-lite tools

use fs_sandbox::sandbox::validate_path_string;
use fs_sandbox::SandboxError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::MediaResult;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProbeMediaParams {
    #[schemars(description = "Path of the media file, inside an allowed directory")]
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ProbeMediaRequest {
    pub path: String,
}

impl ProbeMediaParams {
    pub fn validate(self) -> MediaResult<ProbeMediaRequest> {
        validate_path_string(&self.path)?;
        Ok(ProbeMediaRequest { path: self.path })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    HealthCheck,
    Capabilities,
    ProbeMedia,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::HealthCheck,
        Operation::Capabilities,
        Operation::ProbeMedia,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::HealthCheck => "health_check",
            Operation::Capabilities => "capabilities",
            Operation::ProbeMedia => "probe_media",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

#[derive(Debug, Clone)]
pub enum ToolRequest {
    HealthCheck,
    Capabilities,
    ProbeMedia(ProbeMediaRequest),
}

impl ToolRequest {
    pub fn parse(name: &str, args: Value) -> MediaResult<Self> {
        let op = Operation::from_name(name)
            .ok_or_else(|| SandboxError::UnknownOperation(name.to_string()))?;

        match op {
            Operation::HealthCheck => Ok(ToolRequest::HealthCheck),
            Operation::Capabilities => Ok(ToolRequest::Capabilities),
            Operation::ProbeMedia => from_args::<ProbeMediaParams>(args)?
                .validate()
                .map(ToolRequest::ProbeMedia),
        }
    }

    /// Caller-supplied path, digested into the audit record
    pub fn path(&self) -> Option<&str> {
        match self {
            ToolRequest::ProbeMedia(r) => Some(&r.path),
            _ => None,
        }
    }
}

fn from_args<T: serde::de::DeserializeOwned>(args: Value) -> MediaResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| SandboxError::invalid("arguments", e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxt_common::ToolError;
    use serde_json::json;

    #[test]
    fn test_path_required() {
        let err = ToolRequest::parse("probe_media", json!({})).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let err = ToolRequest::parse("probe_media", json!({"path": ""})).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_request_path() {
        let req = ToolRequest::parse("probe_media", json!({"path": "~/a.mp4"})).unwrap();
        assert_eq!(req.path(), Some("~/a.mp4"));
        assert_eq!(ToolRequest::HealthCheck.path(), None);
    }

    #[test]
    fn test_unknown_operation() {
        let err = ToolRequest::parse("read_file", json!({"path": "x"})).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_OPERATION");
    }
}
