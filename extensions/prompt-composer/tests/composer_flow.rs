//! End-to-end tests for prompt-composer, driving the server in-process

use dxt_common::{result_text, AuditLog, CallToolResult, EmbeddableMcp, MemorySink, Outcome};
use prompt_composer::{Config, PromptComposerServer};
use serde_json::{json, Value};

const CLIENT: &str = "test-client";

fn server_with(config: Config) -> (PromptComposerServer, MemorySink) {
    let audit = MemorySink::new();
    let server = PromptComposerServer::with_config(config, AuditLog::with_writer(audit.clone()));
    (server, audit)
}

fn body(result: &CallToolResult) -> Value {
    assert!(
        !result.is_error.unwrap_or(false),
        "unexpected error: {}",
        result_text(result)
    );
    serde_json::from_str(&result_text(result)).unwrap()
}

async fn save(server: &PromptComposerServer, name: &str, content: &str, tags: &[&str]) -> Value {
    body(
        &server
            .call_tool(
                CLIENT,
                "save_block",
                json!({"name": name, "content": content, "tags": tags}),
            )
            .await,
    )
}

#[tokio::test]
async fn test_save_list_compose_delete() {
    let (server, audit) = server_with(Config::default());

    assert_eq!(save(&server, "role", "You are {{persona}}.", &["system"]).await["created"], true);
    save(&server, "task", "Summarize {{ topic }} for {{audience}}.", &[]).await;
    assert_eq!(save(&server, "role", "You are {{persona}}, terse.", &["system"]).await["created"], false);

    let listed = body(&server.call_tool(CLIENT, "list_blocks", json!({})).await);
    assert_eq!(listed["total_count"], 2);
    assert_eq!(listed["blocks"][0]["name"], "role");
    assert_eq!(listed["blocks"][1]["name"], "task");

    let system = body(
        &server
            .call_tool(CLIENT, "list_blocks", json!({"tag": "system"}))
            .await,
    );
    assert_eq!(system["total_count"], 1);

    let composed = body(
        &server
            .call_tool(
                CLIENT,
                "compose_prompt",
                json!({
                    "blocks": ["role", "task"],
                    "separator": "\n",
                    "variables": {"persona": "an editor", "topic": "the report"}
                }),
            )
            .await,
    );
    assert_eq!(
        composed["prompt"],
        "You are an editor, terse.\nSummarize the report for {{audience}}."
    );
    assert_eq!(composed["blocks_used"], 2);
    assert_eq!(composed["unresolved"], json!(["audience"]));

    let deleted = body(
        &server
            .call_tool(CLIENT, "delete_block", json!({"name": "task"}))
            .await,
    );
    assert_eq!(deleted["deleted"], true);

    let missing = server
        .call_tool(CLIENT, "compose_prompt", json!({"blocks": ["task"]}))
        .await;
    assert_eq!(missing.is_error, Some(true));
    assert_eq!(result_text(&missing), "Error: Block not found: task");

    let records = audit.records();
    assert_eq!(records.len(), 8);
    assert_eq!(records.last().map(|r| r.outcome), Some(Outcome::Error));
    assert!(records
        .iter()
        .all(|r| r.details.as_ref().and_then(|d| d.path_hash.as_ref()).is_none()));
}

#[tokio::test]
async fn test_store_capacity_and_output_cap() {
    let mut config = Config::default();
    config.limits.max_blocks = 1;
    config.limits.max_prompt_bytes = 8;
    let (server, _) = server_with(config);

    save(&server, "a", "0123456789", &[]).await;

    let full = server
        .call_tool(CLIENT, "save_block", json!({"name": "b", "content": "x"}))
        .await;
    assert_eq!(full.is_error, Some(true));
    assert!(result_text(&full).contains("Block store is full"));

    let too_big = server
        .call_tool(CLIENT, "compose_prompt", json!({"blocks": ["a"]}))
        .await;
    assert_eq!(too_big.is_error, Some(true));
    assert_eq!(
        result_text(&too_big),
        "Error: Composed prompt too large: 10 bytes (max: 8)"
    );
}

#[tokio::test]
async fn test_invalid_arguments() {
    let (server, audit) = server_with(Config::default());

    let bad_name = server
        .call_tool(CLIENT, "save_block", json!({"name": "no/slashes", "content": ""}))
        .await;
    assert_eq!(bad_name.is_error, Some(true));
    assert!(result_text(&bad_name).starts_with("Error: Invalid input: name"));

    let wrong_type = server
        .call_tool(CLIENT, "compose_prompt", json!({"blocks": "a"}))
        .await;
    assert_eq!(wrong_type.is_error, Some(true));
    assert!(result_text(&wrong_type).starts_with("Error: Invalid input: arguments"));

    assert_eq!(audit.records().len(), 2);
    assert_eq!(server.dispatcher().limiter().window_len(CLIENT), 0);
}

#[tokio::test]
async fn test_instances_do_not_share_blocks() {
    let (first, _) = server_with(Config::default());
    let (second, _) = server_with(Config::default());

    save(&first, "shared", "only here", &[]).await;

    let listed = body(&second.call_tool(CLIENT, "list_blocks", json!({})).await);
    assert_eq!(listed["total_count"], 0);
}
