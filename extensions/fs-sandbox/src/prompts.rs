//! Prompts served alongside the tools
//!
//! Prompt text never touches the filesystem; the `filepath` argument is
//! echoed into the message as given.

use dxt_common::McpError;
use rmcp::model::{
    GetPromptResult, JsonObject, Prompt, PromptArgument, PromptMessage, PromptMessageRole,
};
use serde_json::Value;

pub const ANALYZE_FILE: &str = "analyze_file";

/// Every prompt this server offers
pub fn list() -> Vec<Prompt> {
    vec![Prompt::new(
        ANALYZE_FILE,
        Some("Analyze a file and provide insights"),
        Some(vec![PromptArgument {
            name: "filepath".to_string(),
            title: None,
            description: Some("Path to the file to analyze".to_string()),
            required: Some(true),
        }]),
    )]
}

/// Render a prompt by name
pub fn get(name: &str, arguments: Option<&JsonObject>) -> Result<GetPromptResult, McpError> {
    if name != ANALYZE_FILE {
        return Err(McpError::invalid_params(
            format!("Unknown prompt: {}", name),
            None,
        ));
    }

    let filepath = arguments
        .and_then(|args| args.get("filepath"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| McpError::invalid_params("filepath argument is required", None))?;

    Ok(GetPromptResult {
        description: Some(format!("Analyze the file at {}", filepath)),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Please analyze the file at {} and provide:\n\
                 1. File type and format\n\
                 2. Size and metadata\n\
                 3. Key insights or patterns\n\
                 4. Potential issues or concerns\n\
                 5. Recommendations for processing or usage",
                filepath
            ),
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::PromptMessageContent;
    use serde_json::json;

    fn args(value: Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_list_declares_required_filepath() {
        let prompts = list();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, ANALYZE_FILE);

        let arguments = prompts[0].arguments.as_ref().unwrap();
        assert_eq!(arguments[0].name, "filepath");
        assert_eq!(arguments[0].required, Some(true));
    }

    #[test]
    fn test_analyze_file_message() {
        let result = get(ANALYZE_FILE, Some(&args(json!({"filepath": "~/report.csv"})))).unwrap();
        assert_eq!(
            result.description.as_deref(),
            Some("Analyze the file at ~/report.csv")
        );

        let text = match &result.messages[0].content {
            PromptMessageContent::Text { text } => text.clone(),
            other => panic!("unexpected content {other:?}"),
        };
        assert!(text.starts_with("Please analyze the file at ~/report.csv and provide:\n1. "));
        assert!(text.ends_with("5. Recommendations for processing or usage"));
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_filepath_required() {
        let missing = get(ANALYZE_FILE, None).unwrap_err();
        assert!(missing.message.contains("filepath argument is required"));

        let blank = get(ANALYZE_FILE, Some(&args(json!({"filepath": "  "})))).unwrap_err();
        assert!(blank.message.contains("filepath argument is required"));
    }

    #[test]
    fn test_unknown_prompt() {
        let err = get("summarize", None).unwrap_err();
        assert!(err.message.contains("Unknown prompt: summarize"));
    }
}
