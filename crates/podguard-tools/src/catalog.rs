//! The fixed set of tools an agent may call.
//!
//! Each tool declares a JSON Schema for its input. The schemas are the
//! contract handed to the model and are also what the dispatcher validates
//! inputs against before touching any component.
//!
//! Confirming a staged transfer is deliberately absent: only an explicit
//! human action may confirm.

use serde::Serialize;
use serde_json::{json, Value};

use podguard_contracts::activity::{ActivityType, TransferDirection, TransferStatus};

pub mod tool_name {
    pub const GET_ALL_PODS: &str = "get_all_pods";
    pub const GET_TOTAL_BALANCE: &str = "get_total_balance";
    pub const GET_POD_BALANCE: &str = "get_pod_balance";
    pub const GET_POD_DETAIL: &str = "get_pod_detail";
    pub const REQUEST_TRANSFER: &str = "request_transfer";
    pub const CANCEL_TRANSFER: &str = "cancel_transfer";
    pub const GET_RECENT_ACTIVITY: &str = "get_recent_activity";
    pub const GET_TRANSFER_STATUS: &str = "get_transfer_status";
    pub const GET_ACTIVITY_SUMMARY: &str = "get_activity_summary";
    pub const GET_ALL_ACCOUNTS: &str = "get_all_accounts";
    pub const SAVE_MEMORY: &str = "save_memory";
    pub const DELETE_MEMORY: &str = "delete_memory";
    pub const LIST_MEMORIES: &str = "list_memories";
}

/// One tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn no_input() -> Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

/// Every tool, in the order they are advertised.
pub fn catalog() -> Vec<ToolSpec> {
    use tool_name::*;

    let directions: Vec<&str> = TransferDirection::ALL.iter().map(|d| d.as_str()).collect();
    let statuses: Vec<&str> = TransferStatus::ALL.iter().map(|s| s.as_str()).collect();
    let activity_types: Vec<&str> = ActivityType::ALL.iter().map(|t| t.as_str()).collect();

    vec![
        ToolSpec {
            name: GET_ALL_PODS,
            description: "List every pod with its current balance. Use when the user asks about \
                          all pods or wants to compare them.",
            input_schema: no_input(),
        },
        ToolSpec {
            name: GET_TOTAL_BALANCE,
            description: "Total balance across all pods.",
            input_schema: no_input(),
        },
        ToolSpec {
            name: GET_POD_BALANCE,
            description: "Look up one pod by name and return its balance.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pod_name": { "type": "string", "description": "Pod name, case-insensitive." }
                },
                "required": ["pod_name"]
            }),
        },
        ToolSpec {
            name: GET_POD_DETAIL,
            description: "Detailed view of a pod including bank details and recent transfers.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pod_id": { "type": "string", "description": "The pod's unique id." }
                },
                "required": ["pod_id"]
            }),
        },
        ToolSpec {
            name: REQUEST_TRANSFER,
            description: "Stage a transfer between two pods or ports. This does NOT move money: \
                          it validates the request and returns a confirmation payload, and the \
                          user must confirm before anything executes. Always include a short \
                          note describing the transfer unless the user declines one.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source_name": { "type": "string", "description": "Source pod or port name." },
                    "destination_name": { "type": "string", "description": "Destination pod or port name." },
                    "amount_dollars": { "type": "number", "description": "Amount in dollars, e.g. 50.00." },
                    "note": { "type": "string", "description": "Short description, at most 100 characters." }
                },
                "required": ["source_name", "destination_name", "amount_dollars"]
            }),
        },
        ToolSpec {
            name: CANCEL_TRANSFER,
            description: "Cancel a staged transfer that has not been confirmed yet.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pending_transfer_id": { "type": "string", "description": "Id returned by request_transfer." }
                },
                "required": ["pending_transfer_id"]
            }),
        },
        ToolSpec {
            name: GET_RECENT_ACTIVITY,
            description: "Recent transfer activity, optionally filtered.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "count": { "type": "integer", "minimum": 1, "description": "How many transfers to return (default 10)." },
                    "direction": { "type": "string", "enum": directions },
                    "status": { "type": "string", "enum": statuses },
                    "activity_type": { "type": "string", "enum": activity_types }
                },
                "required": []
            }),
        },
        ToolSpec {
            name: GET_TRANSFER_STATUS,
            description: "Full status of one executed transfer.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "transfer_id": { "type": "string", "description": "The transfer reference id." }
                },
                "required": ["transfer_id"]
            }),
        },
        ToolSpec {
            name: GET_ACTIVITY_SUMMARY,
            description: "This month's transfer count, rule executions and incoming funds.",
            input_schema: no_input(),
        },
        ToolSpec {
            name: GET_ALL_ACCOUNTS,
            description: "List pods, ports (income sources) and external accounts.",
            input_schema: no_input(),
        },
        ToolSpec {
            name: SAVE_MEMORY,
            description: "Remember a fact across conversations. Pass fact_id to update an \
                          existing fact instead of adding a new one.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "The fact to remember." },
                    "fact_id": { "type": "string", "description": "Existing fact to update." }
                },
                "required": ["content"]
            }),
        },
        ToolSpec {
            name: DELETE_MEMORY,
            description: "Forget a fact by id.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "fact_id": { "type": "string" }
                },
                "required": ["fact_id"]
            }),
        },
        ToolSpec {
            name: LIST_MEMORIES,
            description: "List every remembered fact.",
            input_schema: no_input(),
        },
    ]
}
