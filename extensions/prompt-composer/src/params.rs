//! Parameter types for prompt-composer tools

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compose::{is_placeholder_key, DEFAULT_SEPARATOR};
use crate::types::{ComposerError, ComposerResult};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_BLOCK_BYTES: usize = 64 * 1024;
pub const MAX_TAGS: usize = 16;
pub const MAX_BLOCKS_PER_PROMPT: usize = 32;
pub const MAX_SEPARATOR_LEN: usize = 256;
pub const MAX_VARIABLES: usize = 128;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveBlockParams {
    #[schemars(description = "Block name: letters, digits, '_' or '-', up to 64 characters")]
    pub name: String,

    #[schemars(description = "Block text; may contain {{placeholders}}")]
    pub content: String,

    #[schemars(description = "Optional tags for filtering")]
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListBlocksParams {
    #[schemars(description = "Only list blocks carrying this tag")]
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteBlockParams {
    #[schemars(description = "Name of the block to delete")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ComposePromptParams {
    #[schemars(description = "Block names, in the order they should appear")]
    pub blocks: Vec<String>,

    #[schemars(description = "Text placed between blocks (default: blank line)")]
    #[serde(default)]
    pub separator: Option<String>,

    #[schemars(description = "Values for {{placeholders}} in the blocks")]
    #[serde(default)]
    pub variables: Option<HashMap<String, String>>,
}

// ============================================================================
// Validated requests
// ============================================================================

#[derive(Debug, Clone)]
pub struct SaveBlockRequest {
    pub name: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListBlocksRequest {
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeleteBlockRequest {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ComposePromptRequest {
    pub blocks: Vec<String>,
    pub separator: String,
    pub variables: HashMap<String, String>,
}

fn validate_name(field: &'static str, name: &str) -> ComposerResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ComposerError::invalid(
            field,
            format!("must be 1 to {} characters", MAX_NAME_LEN),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ComposerError::invalid(
            field,
            format!("'{}' may only contain letters, digits, '_' and '-'", name),
        ));
    }
    Ok(())
}

impl SaveBlockParams {
    pub fn validate(self) -> ComposerResult<SaveBlockRequest> {
        validate_name("name", &self.name)?;
        if self.content.len() > MAX_BLOCK_BYTES {
            return Err(ComposerError::invalid(
                "content",
                format!("longer than {} bytes", MAX_BLOCK_BYTES),
            ));
        }

        let tags = self.tags.unwrap_or_default();
        if tags.len() > MAX_TAGS {
            return Err(ComposerError::invalid(
                "tags",
                format!("at most {} tags", MAX_TAGS),
            ));
        }
        for tag in &tags {
            validate_name("tags", tag)?;
        }

        Ok(SaveBlockRequest {
            name: self.name,
            content: self.content,
            tags,
        })
    }
}

impl ListBlocksParams {
    pub fn validate(self) -> ComposerResult<ListBlocksRequest> {
        if let Some(tag) = &self.tag {
            validate_name("tag", tag)?;
        }
        Ok(ListBlocksRequest { tag: self.tag })
    }
}

impl DeleteBlockParams {
    pub fn validate(self) -> ComposerResult<DeleteBlockRequest> {
        validate_name("name", &self.name)?;
        Ok(DeleteBlockRequest { name: self.name })
    }
}

impl ComposePromptParams {
    pub fn validate(self) -> ComposerResult<ComposePromptRequest> {
        if self.blocks.is_empty() || self.blocks.len() > MAX_BLOCKS_PER_PROMPT {
            return Err(ComposerError::invalid(
                "blocks",
                format!("must name 1 to {} blocks", MAX_BLOCKS_PER_PROMPT),
            ));
        }
        for name in &self.blocks {
            validate_name("blocks", name)?;
        }

        let separator = self
            .separator
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        if separator.len() > MAX_SEPARATOR_LEN {
            return Err(ComposerError::invalid(
                "separator",
                format!("longer than {} bytes", MAX_SEPARATOR_LEN),
            ));
        }

        let variables = self.variables.unwrap_or_default();
        if variables.len() > MAX_VARIABLES {
            return Err(ComposerError::invalid(
                "variables",
                format!("at most {} variables", MAX_VARIABLES),
            ));
        }
        for (key, value) in &variables {
            if !is_placeholder_key(key) {
                return Err(ComposerError::invalid(
                    "variables",
                    format!("'{}' is not a valid placeholder name", key),
                ));
            }
            if value.len() > MAX_BLOCK_BYTES {
                return Err(ComposerError::invalid(
                    "variables",
                    format!("value of '{}' is longer than {} bytes", key, MAX_BLOCK_BYTES),
                ));
            }
        }

        Ok(ComposePromptRequest {
            blocks: self.blocks,
            separator,
            variables,
        })
    }
}

// ============================================================================
// Operation registry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    HealthCheck,
    Capabilities,
    SaveBlock,
    ListBlocks,
    DeleteBlock,
    ComposePrompt,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::HealthCheck,
        Operation::Capabilities,
        Operation::SaveBlock,
        Operation::ListBlocks,
        Operation::DeleteBlock,
        Operation::ComposePrompt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::HealthCheck => "health_check",
            Operation::Capabilities => "capabilities",
            Operation::SaveBlock => "save_block",
            Operation::ListBlocks => "list_blocks",
            Operation::DeleteBlock => "delete_block",
            Operation::ComposePrompt => "compose_prompt",
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
    SaveBlock(SaveBlockRequest),
    ListBlocks(ListBlocksRequest),
    DeleteBlock(DeleteBlockRequest),
    ComposePrompt(ComposePromptRequest),
}

impl ToolRequest {
    pub fn parse(name: &str, args: Value) -> ComposerResult<Self> {
        let op = Operation::from_name(name)
            .ok_or_else(|| ComposerError::UnknownOperation(name.to_string()))?;

        match op {
            Operation::HealthCheck => Ok(ToolRequest::HealthCheck),
            Operation::Capabilities => Ok(ToolRequest::Capabilities),
            Operation::SaveBlock => from_args::<SaveBlockParams>(args)?
                .validate()
                .map(ToolRequest::SaveBlock),
            Operation::ListBlocks => from_args::<ListBlocksParams>(args)?
                .validate()
                .map(ToolRequest::ListBlocks),
            Operation::DeleteBlock => from_args::<DeleteBlockParams>(args)?
                .validate()
                .map(ToolRequest::DeleteBlock),
            Operation::ComposePrompt => from_args::<ComposePromptParams>(args)?
                .validate()
                .map(ToolRequest::ComposePrompt),
        }
    }
}

fn from_args<T: serde::de::DeserializeOwned>(args: Value) -> ComposerResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ComposerError::invalid("arguments", e.to_string()))
}
