//! Tool dispatch: name + JSON input → JSON reply.
//!
//! `dispatch()` never fails. Every outcome, including unknown tools and
//! malformed input, comes back as a JSON object; failures carry a single
//! `"error"` string suitable for showing to the model or the user.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use podguard_contracts::{
    activity::ActivityQuery,
    actor::Actor,
    error::{GuardError, GuardResult},
    transfer::TransferRequest,
};
use podguard_core::{
    resolve::{resolve, ListHint},
    TransferDesk,
};
use podguard_store::FactStore;

use crate::catalog::{catalog, tool_name, ToolSpec};

/// Per-turn state threaded through every tool call of one agent turn.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub actor: Option<Actor>,
    /// Ids staged during this turn, in order, so the front-end can attach
    /// confirm/cancel controls to them.
    pub staged_this_turn: Vec<String>,
}

impl ToolContext {
    pub fn new(actor: Option<Actor>) -> Self {
        Self { actor, staged_this_turn: Vec::new() }
    }
}

#[derive(Deserialize)]
struct PodNameInput {
    pod_name: String,
}

#[derive(Deserialize)]
struct PodIdInput {
    pod_id: String,
}

#[derive(Deserialize)]
struct PendingIdInput {
    pending_transfer_id: String,
}

#[derive(Deserialize)]
struct TransferIdInput {
    transfer_id: String,
}

#[derive(Deserialize)]
struct SaveMemoryInput {
    content: String,
    #[serde(default)]
    fact_id: Option<String>,
}

#[derive(Deserialize)]
struct FactIdInput {
    fact_id: String,
}

#[derive(Serialize)]
struct FactSummary<'a> {
    id: &'a str,
    content: &'a str,
    created_by: &'a str,
}

pub struct ToolDispatcher {
    desk: Arc<TransferDesk>,
    facts: Option<Arc<FactStore>>,
    specs: Vec<ToolSpec>,
    validators: HashMap<&'static str, jsonschema::Validator>,
}

impl ToolDispatcher {
    /// Build a dispatcher over `desk`, compiling every tool's input schema.
    ///
    /// Returns `GuardError::ConfigError` if a schema does not compile.
    pub fn new(desk: Arc<TransferDesk>) -> GuardResult<Self> {
        let specs = catalog();
        let mut validators = HashMap::with_capacity(specs.len());
        for spec in &specs {
            let validator = jsonschema::validator_for(&spec.input_schema).map_err(|e| GuardError::ConfigError {
                reason: format!("invalid input schema for tool '{}': {}", spec.name, e),
            })?;
            validators.insert(spec.name, validator);
        }
        Ok(Self { desk, facts: None, specs, validators })
    }

    pub fn with_facts(mut self, facts: Arc<FactStore>) -> Self {
        self.facts = Some(facts);
        self
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn desk(&self) -> &Arc<TransferDesk> {
        &self.desk
    }

    /// Run a tool and fold any error into `{"error": "..."}`.
    pub fn dispatch(&self, name: &str, input: &Value, ctx: &mut ToolContext) -> Value {
        match self.try_dispatch(name, input, ctx) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                json!({ "error": e.user_message() })
            }
        }
    }

    /// `dispatch` over raw JSON text, for transports that carry strings.
    pub fn dispatch_json(&self, name: &str, input: &str, ctx: &mut ToolContext) -> String {
        let reply = match serde_json::from_str::<Value>(input) {
            Ok(value) => self.dispatch(name, &value, ctx),
            Err(e) => json!({
                "error": GuardError::InvalidToolInput { tool: name.to_string(), reason: e.to_string() }.user_message()
            }),
        };
        reply.to_string()
    }

    /// Validate the input and run the tool, surfacing errors as errors.
    pub fn try_dispatch(&self, name: &str, input: &Value, ctx: &mut ToolContext) -> GuardResult<Value> {
        let validator = self.validators.get(name).ok_or_else(|| GuardError::UnknownTool(name.to_string()))?;

        // No-argument tools are often called with no input at all.
        let empty = json!({});
        let input = if input.is_null() { &empty } else { input };

        let problems: Vec<String> = validator
            .iter_errors(input)
            .map(|e| {
                let at = e.instance_path.to_string();
                if at.is_empty() { e.to_string() } else { format!("{} at {}", e, at) }
            })
            .collect();
        if !problems.is_empty() {
            return Err(GuardError::InvalidToolInput { tool: name.to_string(), reason: problems.join("; ") });
        }

        info!(tool = %name, "executing tool");
        let platform = self.desk.platform();

        let reply = match name {
            tool_name::GET_ALL_PODS => {
                let pods = platform.fetch_accounts()?.pods;
                json!({ "count": pods.len(), "pods": pods })
            }
            tool_name::GET_TOTAL_BALANCE => to_value(&platform.fetch_accounts()?.total_balance())?,
            tool_name::GET_POD_BALANCE => {
                let PodNameInput { pod_name } = parse(name, input)?;
                let accounts = platform.fetch_accounts()?;
                let pod = resolve(&pod_name, &accounts.pods).into_result("Pod", &pod_name, ListHint::Pods)?;
                to_value(pod)?
            }
            tool_name::GET_POD_DETAIL => {
                let PodIdInput { pod_id } = parse(name, input)?;
                platform.pod_detail(&pod_id)?
            }
            tool_name::REQUEST_TRANSFER => {
                let request: TransferRequest = parse(name, input)?;
                let staged = self.desk.stage(&request, ctx.actor.as_ref())?;
                ctx.staged_this_turn.push(staged.pending_transfer_id.clone());
                to_value(&staged)?
            }
            tool_name::CANCEL_TRANSFER => {
                let PendingIdInput { pending_transfer_id } = parse(name, input)?;
                to_value(&self.desk.cancel(&pending_transfer_id, ctx.actor.as_ref())?)?
            }
            tool_name::GET_RECENT_ACTIVITY => {
                let query: ActivityQuery = parse(name, input)?;
                platform.recent_activity(&query)?
            }
            tool_name::GET_TRANSFER_STATUS => {
                let TransferIdInput { transfer_id } = parse(name, input)?;
                platform.transfer_status(&transfer_id)?
            }
            tool_name::GET_ACTIVITY_SUMMARY => platform.activity_summary()?,
            tool_name::GET_ALL_ACCOUNTS => to_value(&platform.fetch_accounts()?)?,
            tool_name::SAVE_MEMORY => {
                let facts = self.facts()?;
                let SaveMemoryInput { content, fact_id } = parse(name, input)?;
                match fact_id.filter(|id| !id.is_empty()) {
                    Some(id) => {
                        let fact = facts.update(&id, &content)?;
                        json!({ "success": true, "fact_id": fact.id, "updated": true })
                    }
                    None => {
                        let created_by = ctx.actor.as_ref().and_then(|a| a.name.as_deref()).unwrap_or("unknown");
                        let fact = facts.save(&content, created_by)?;
                        json!({ "success": true, "fact_id": fact.id, "created": true })
                    }
                }
            }
            tool_name::DELETE_MEMORY => {
                let facts = self.facts()?;
                let FactIdInput { fact_id } = parse(name, input)?;
                facts.delete(&fact_id)?;
                json!({ "success": true, "deleted": fact_id })
            }
            tool_name::LIST_MEMORIES => {
                let facts = self.facts()?.facts();
                let summaries: Vec<FactSummary<'_>> = facts
                    .iter()
                    .map(|f| FactSummary { id: &f.id, content: &f.content, created_by: &f.created_by })
                    .collect();
                json!({ "count": summaries.len(), "facts": summaries })
            }
            other => return Err(GuardError::UnknownTool(other.to_string())),
        };

        debug!(tool = %name, "tool completed");
        Ok(reply)
    }

    fn facts(&self) -> GuardResult<&FactStore> {
        self.facts.as_deref().ok_or(GuardError::MemoryUnavailable)
    }
}

fn parse<T: DeserializeOwned>(tool: &str, input: &Value) -> GuardResult<T> {
    T::deserialize(input).map_err(|e| GuardError::InvalidToolInput { tool: tool.to_string(), reason: e.to_string() })
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> GuardResult<Value> {
    serde_json::to_value(value).map_err(|e| GuardError::ConfigError {
        reason: format!("failed to serialize tool reply: {}", e),
    })
}
