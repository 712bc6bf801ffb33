//! # podguard-tools
//!
//! The agent-facing surface of the safeguards: a fixed tool catalog with a
//! JSON Schema per tool, and a dispatcher that validates input against those
//! schemas before routing to the desk, the platform or the fact store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use podguard_tools::{ToolContext, ToolDispatcher};
//!
//! let tools = ToolDispatcher::new(desk)?.with_facts(facts);
//! let mut ctx = ToolContext::new(Some(actor));
//! let reply = tools.dispatch("get_pod_balance", &json!({"pod_name": "rent"}), &mut ctx);
//! ```

pub mod catalog;
pub mod dispatch;

pub use catalog::{catalog, tool_name, ToolSpec};
pub use dispatch::{ToolContext, ToolDispatcher};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use podguard_contracts::{
        account::{Account, AccountKind, AccountSet},
        activity::ActivityQuery,
        actor::Actor,
        error::PlatformError,
        transfer::{TransferOrder, TransferReceipt},
    };
    use podguard_core::{traits::PlatformClient, DeskLimits, TransferDesk};
    use podguard_store::FactStore;

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    struct MockPlatform {
        accounts: AccountSet,
        executed: Mutex<Vec<TransferOrder>>,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                accounts: AccountSet {
                    pods: vec![
                        Account::new("pod-rent", "Rent", AccountKind::Pod, 120_000),
                        Account::new("pod-groc", "Groceries", AccountKind::Pod, 40_000),
                        Account::new("pod-save", "Savings", AccountKind::Pod, 2_000_000),
                    ],
                    ports: vec![Account::new("port-pay", "Paycheck", AccountKind::Port, 300_000)],
                    accounts: vec![],
                },
                executed: Mutex::new(vec![]),
            }
        }
    }

    impl PlatformClient for MockPlatform {
        fn fetch_accounts(&self) -> Result<AccountSet, PlatformError> {
            Ok(self.accounts.clone())
        }

        fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError> {
            self.executed.lock().unwrap().push(order.clone());
            Ok(TransferReceipt { id: "xfer-1".to_string(), status: None })
        }

        fn pod_detail(&self, pod_id: &str) -> Result<Value, PlatformError> {
            Ok(json!({ "id": pod_id }))
        }

        // Echo the query so tests can see what the dispatcher built.
        fn recent_activity(&self, query: &ActivityQuery) -> Result<Value, PlatformError> {
            Ok(serde_json::to_value(query).unwrap())
        }

        fn transfer_status(&self, _transfer_id: &str) -> Result<Value, PlatformError> {
            Err(PlatformError::Upstream("connection reset".to_string()))
        }

        fn activity_summary(&self) -> Result<Value, PlatformError> {
            Ok(json!({ "transfers": 3 }))
        }
    }

    fn dispatcher() -> (ToolDispatcher, Arc<MockPlatform>) {
        let platform = Arc::new(MockPlatform::new());
        let desk = TransferDesk::new(platform.clone(), DeskLimits::default());
        (ToolDispatcher::new(Arc::new(desk)).unwrap(), platform)
    }

    fn alice() -> ToolContext {
        ToolContext::new(Some(Actor::named("alice", "Alice")))
    }

    fn error_of(reply: &Value) -> &str {
        reply["error"].as_str().unwrap_or_default()
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    #[test]
    fn test_catalog_names_are_unique_and_exclude_confirm() {
        let tools = catalog();
        assert_eq!(tools.len(), 13);

        let names: HashSet<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), tools.len());
        assert!(names.contains(tool_name::REQUEST_TRANSFER));
        assert!(!names.iter().any(|n| n.contains("confirm")));
    }

    #[test]
    fn test_catalog_schemas_are_objects() {
        for tool in catalog() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty(), "{}", tool.name);
        }
    }

    #[test]
    fn test_activity_schema_lists_every_filter_value() {
        let tools = catalog();
        let activity = tools.iter().find(|t| t.name == tool_name::GET_RECENT_ACTIVITY).unwrap();
        let types = activity.input_schema["properties"]["activity_type"]["enum"].as_array().unwrap();
        assert_eq!(types.len(), 5);
        assert!(types.contains(&json!("PULLED_FROM_SEQUENCE")));
    }

    // ── Validation ───────────────────────────────────────────────────────────

    #[test]
    fn test_unknown_tool() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch("confirm_transfer", &json!({}), &mut alice());
        assert_eq!(error_of(&reply), "Unknown tool: confirm_transfer");
    }

    #[test]
    fn test_missing_required_field_is_rejected_before_staging() {
        let (tools, _) = dispatcher();
        let mut ctx = alice();
        let reply = tools.dispatch(
            tool_name::REQUEST_TRANSFER,
            &json!({ "source_name": "Savings", "destination_name": "Rent" }),
            &mut ctx,
        );
        let error = error_of(&reply);
        assert!(error.starts_with("Invalid input for request_transfer"), "{error}");
        assert!(error.contains("amount_dollars"), "{error}");
        assert!(ctx.staged_this_turn.is_empty());
        assert_eq!(tools.desk().pending_count(), 0);
    }

    #[test]
    fn test_bad_enum_value_is_rejected() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(
            tool_name::GET_RECENT_ACTIVITY,
            &json!({ "direction": "SIDEWAYS" }),
            &mut alice(),
        );
        assert!(error_of(&reply).starts_with("Invalid input for get_recent_activity"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(
            tool_name::REQUEST_TRANSFER,
            &json!({ "source_name": "Savings", "destination_name": "Rent", "amount_dollars": "fifty" }),
            &mut alice(),
        );
        assert!(error_of(&reply).contains("/amount_dollars"));
    }

    #[test]
    fn test_dispatch_json_rejects_malformed_text() {
        let (tools, _) = dispatcher();
        let reply: Value =
            serde_json::from_str(&tools.dispatch_json(tool_name::GET_ALL_PODS, "{not json", &mut alice())).unwrap();
        assert!(error_of(&reply).starts_with("Invalid input for get_all_pods"));
    }

    // ── Read-only tools ──────────────────────────────────────────────────────

    #[test]
    fn test_null_input_counts_as_empty_object() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::GET_ALL_PODS, &Value::Null, &mut alice());
        assert_eq!(reply["count"], 3);
        assert_eq!(reply["pods"][0]["name"], "Rent");
    }

    #[test]
    fn test_pod_balance_resolves_case_insensitively() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::GET_POD_BALANCE, &json!({ "pod_name": "rent" }), &mut alice());
        assert_eq!(reply["id"], "pod-rent");
        assert_eq!(reply["balance"], "$1,200.00");
    }

    #[test]
    fn test_pod_balance_not_found_suggests_listing() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::GET_POD_BALANCE, &json!({ "pod_name": "Vacation" }), &mut alice());
        assert_eq!(
            error_of(&reply),
            "Pod 'Vacation' not found. Try using get_all_pods to see available pods."
        );
    }

    #[test]
    fn test_recent_activity_defaults_count() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::GET_RECENT_ACTIVITY, &json!({}), &mut alice());
        assert_eq!(reply["count"], ActivityQuery::DEFAULT_COUNT);
        assert!(reply.get("direction").is_none());

        let reply = tools.dispatch(
            tool_name::GET_RECENT_ACTIVITY,
            &json!({ "count": 3, "activity_type": "MONEY_IN" }),
            &mut alice(),
        );
        assert_eq!(reply["count"], 3);
        assert_eq!(reply["activity_type"], "MONEY_IN");
    }

    #[test]
    fn test_upstream_failure_is_masked() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::GET_TRANSFER_STATUS, &json!({ "transfer_id": "t-9" }), &mut alice());
        assert_eq!(error_of(&reply), "Something went wrong. Please try again.");
    }

    // ── Transfers ────────────────────────────────────────────────────────────

    #[test]
    fn test_request_transfer_stages_and_tracks_id() {
        let (tools, platform) = dispatcher();
        let mut ctx = alice();
        let reply = tools.dispatch(
            tool_name::REQUEST_TRANSFER,
            &json!({ "source_name": "Savings", "destination_name": "Rent", "amount_dollars": 50.0, "note": "March" }),
            &mut ctx,
        );

        let id = reply["pending_transfer_id"].as_str().unwrap().to_string();
        assert_eq!(reply["amount"], "$50.00");
        assert_eq!(ctx.staged_this_turn, vec![id.clone()]);
        assert!(tools.desk().pending(&id).is_some());
        assert!(platform.executed.lock().unwrap().is_empty(), "staging never executes");
    }

    #[test]
    fn test_cancel_transfer_through_tool() {
        let (tools, _) = dispatcher();
        let mut ctx = alice();
        let staged = tools.dispatch(
            tool_name::REQUEST_TRANSFER,
            &json!({ "source_name": "Savings", "destination_name": "Groceries", "amount_dollars": 20 }),
            &mut ctx,
        );
        let id = staged["pending_transfer_id"].as_str().unwrap();

        let reply = tools.dispatch(tool_name::CANCEL_TRANSFER, &json!({ "pending_transfer_id": id }), &mut ctx);
        assert_eq!(reply["success"], true);
        assert_eq!(tools.desk().pending_count(), 0);

        let again = tools.dispatch(tool_name::CANCEL_TRANSFER, &json!({ "pending_transfer_id": id }), &mut ctx);
        assert_eq!(error_of(&again), "No pending transfer found with that ID.");
    }

    // ── Memory ───────────────────────────────────────────────────────────────

    #[test]
    fn test_memory_tools_without_store() {
        let (tools, _) = dispatcher();
        let reply = tools.dispatch(tool_name::LIST_MEMORIES, &json!({}), &mut alice());
        assert_eq!(error_of(&reply), "Memory is not available.");
    }

    #[test]
    fn test_memory_save_update_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let facts = Arc::new(FactStore::open(dir.path().join("memories.json"), 10));
        let (tools, _) = dispatcher();
        let tools = tools.with_facts(facts.clone());
        let mut ctx = alice();

        let saved = tools.dispatch(tool_name::SAVE_MEMORY, &json!({ "content": "Rent is due on the 1st" }), &mut ctx);
        assert_eq!(saved["created"], true);
        let id = saved["fact_id"].as_str().unwrap().to_string();

        let updated = tools.dispatch(
            tool_name::SAVE_MEMORY,
            &json!({ "content": "Rent is due on the 3rd", "fact_id": id }),
            &mut ctx,
        );
        assert_eq!(updated["updated"], true);

        let listed = tools.dispatch(tool_name::LIST_MEMORIES, &json!({}), &mut ctx);
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["facts"][0]["content"], "Rent is due on the 3rd");
        assert_eq!(listed["facts"][0]["created_by"], "Alice");

        let deleted = tools.dispatch(tool_name::DELETE_MEMORY, &json!({ "fact_id": id }), &mut ctx);
        assert_eq!(deleted["deleted"], id.as_str());
        assert!(facts.is_empty());

        let missing = tools.dispatch(tool_name::DELETE_MEMORY, &json!({ "fact_id": id }), &mut ctx);
        assert!(error_of(&missing).contains("not found"));
    }

    #[test]
    fn test_memory_author_defaults_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let facts = Arc::new(FactStore::open(dir.path().join("memories.json"), 10));
        let (tools, _) = dispatcher();
        let tools = tools.with_facts(facts.clone());

        tools.dispatch(tool_name::SAVE_MEMORY, &json!({ "content": "x" }), &mut ToolContext::new(None));
        assert_eq!(facts.facts()[0].created_by, "unknown");
    }
}
