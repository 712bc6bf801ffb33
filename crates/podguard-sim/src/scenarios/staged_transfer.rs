//! Scenario 1: Staged Transfer
//!
//! The agent looks up a pod and stages a transfer. Nothing moves until the
//! human presses "Confirm", at which point the desk executes, the spend is
//! recorded against the daily limit and both steps land in the audit log.
//!
//!   1. Agent turn: `get_pod_balance` then `request_transfer`
//!   2. The staged id is collected for the confirm/cancel buttons
//!   3. Human confirms via `TransferDesk::complete`
//!   4. Balances move; tracker and audit log reflect the transfer

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use podguard_contracts::{
    account::format_cents,
    actor::{Actor, ActorKey},
    error::{GuardError, GuardResult},
    transfer::ConfirmedTransfer,
};
use podguard_core::{SystemClock, Throttle};
use podguard_tools::tool_name;

use crate::{config_for, MockPlatform, Runtime};

pub struct Outcome {
    pub balance_reply: Value,
    pub staged_reply: Value,
    pub staged: Vec<String>,
    pub balance_before_confirm: Option<i64>,
    pub confirmed: ConfirmedTransfer,
    pub rent_after: Option<i64>,
    pub groceries_after: Option<i64>,
    pub used_today: i64,
    pub audit_trail: Vec<String>,
}

pub fn run(data_dir: &Path) -> GuardResult<Outcome> {
    let config = config_for(data_dir);
    let platform = Arc::new(MockPlatform::sample());
    let runtime = Runtime::build(&config, platform.clone(), Throttle::disabled(), Arc::new(SystemClock))?;
    let alice = Actor::named("alice", "Alice");

    let turn = runtime.agent_turn(
        &alice,
        &[
            (tool_name::GET_POD_BALANCE, json!({ "pod_name": "rent" })),
            (
                tool_name::REQUEST_TRANSFER,
                json!({
                    "source_name": "Rent",
                    "destination_name": "Groceries",
                    "amount_dollars": 100.0,
                    "note": "Weekly groceries"
                }),
            ),
        ],
    )?;

    let transfer_id = turn.staged.first().cloned().ok_or(GuardError::TransferNotFound)?;
    let balance_before_confirm = platform.balance_of("Rent");

    let confirmed = runtime.desk.complete(&transfer_id, Some(&alice))?;

    Ok(Outcome {
        balance_reply: turn.replies[0].clone(),
        staged_reply: turn.replies[1].clone(),
        staged: turn.staged,
        balance_before_confirm,
        confirmed,
        rent_after: platform.balance_of("Rent"),
        groceries_after: platform.balance_of("Groceries"),
        used_today: runtime.tracker.used_today(&ActorKey::User(alice.id.clone())),
        audit_trail: runtime.audit.read_all()?.into_iter().map(|e| e.event_type).collect(),
    })
}

/// Run Scenario 1 and print each step.
pub fn run_scenario(data_dir: &Path) -> GuardResult<()> {
    println!("=== Scenario 1: Staged Transfer ===");
    println!();

    let outcome = run(data_dir)?;

    println!("  Agent: get_pod_balance {{\"pod_name\": \"rent\"}}");
    println!("    → {} has {}", outcome.balance_reply["name"], outcome.balance_reply["balance"]);
    println!("  Agent: request_transfer Rent → Groceries, $100.00");
    println!("    → {}", outcome.staged_reply["message"].as_str().unwrap_or("?"));
    println!("    → staged this turn: {:?}", outcome.staged);
    println!(
        "  Rent balance before confirm: {} (unchanged)",
        outcome.balance_before_confirm.map(format_cents).unwrap_or_default()
    );
    println!();
    println!("  Human: [Confirm]");
    println!("    → receipt {} for {}", outcome.confirmed.receipt.id, outcome.confirmed.amount);
    println!(
        "    → Rent {} / Groceries {}",
        outcome.rent_after.map(format_cents).unwrap_or_default(),
        outcome.groceries_after.map(format_cents).unwrap_or_default()
    );
    println!("    → spent today by alice: {}", format_cents(outcome.used_today));
    println!("  Audit trail: {}", outcome.audit_trail.join(" → "));
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_transfer_only_moves_after_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path()).unwrap();

        assert_eq!(outcome.balance_reply["balance"], "$1,200.00");
        assert_eq!(outcome.staged.len(), 1);
        assert_eq!(outcome.staged_reply["pending_transfer_id"], outcome.staged[0].as_str());
        assert_eq!(outcome.balance_before_confirm, Some(120_000));

        assert_eq!(outcome.confirmed.amount_cents, 10_000);
        assert_eq!(outcome.rent_after, Some(110_000));
        assert_eq!(outcome.groceries_after, Some(50_000));
    }

    #[test]
    fn test_confirmation_is_recorded_and_audited() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path()).unwrap();

        assert_eq!(outcome.used_today, 10_000);
        assert_eq!(outcome.audit_trail, vec!["transfer_staged", "transfer_confirmed"]);
        assert!(dir.path().join(".daily_limits.json").exists());
        assert_eq!(fs::read_to_string(dir.path().join(".audit.jsonl")).unwrap().lines().count(), 2);
    }
}
