//! Scenario 2: Daily Limit
//!
//! Cumulative spend is capped per actor per calendar day. The tracker is
//! consulted when a transfer is staged and again when it is confirmed.
//!
//!   1. Alice has moved $80.00 today against a $100.00 ceiling
//!   2. A $50.00 check is refused with $20.00 remaining
//!   3. Bob has used his entire ceiling; even one cent is refused
//!   4. Alice's agent tries to stage $50.00 and gets the limit message
//!   5. A flat-list file from an older deployment is migrated on open

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use podguard_contracts::{
    actor::{Actor, ActorKey},
    error::{GuardError, GuardResult},
    spend::LimitCheck,
};
use podguard_core::{traits::SpendLedger, Clock, ManualClock, Throttle};
use podguard_limits::DailyLimitTracker;
use podguard_tools::tool_name;

use crate::{config_for, fixed_instant, MockPlatform, Runtime};

/// The ceiling used throughout this scenario, in cents.
pub const CEILING_CENTS: i64 = 10_000;

const LEGACY_FILE: &str = "legacy_daily_limits.json";

pub struct Outcome {
    pub partial: LimitCheck,
    pub exhausted: LimitCheck,
    pub stage_error: String,
    pub legacy: LimitCheck,
    pub migrated_file: Value,
}

pub fn run(data_dir: &Path) -> GuardResult<Outcome> {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(fixed_instant("2025-06-01T12:00:00Z")?));

    let mut config = config_for(data_dir);
    config.safeguards.max_daily_transfer_cents = CEILING_CENTS;
    let runtime = Runtime::build(&config, Arc::new(MockPlatform::sample()), Throttle::disabled(), clock.clone())?;

    let alice = Actor::named("alice", "Alice");
    let alice_key = ActorKey::User(alice.id.clone());
    let bob_key = ActorKey::User("bob".into());

    runtime.tracker.record(8_000, "sim-a1", &alice_key)?;
    let partial = runtime.tracker.check(5_000, &alice_key);

    runtime.tracker.record(10_000, "sim-b1", &bob_key)?;
    let exhausted = runtime.tracker.check(1, &bob_key);

    let turn = runtime.agent_turn(
        &alice,
        &[(
            tool_name::REQUEST_TRANSFER,
            json!({ "source_name": "Emergency Savings", "destination_name": "Vacation", "amount_dollars": 50 }),
        )],
    )?;
    let stage_error = turn.replies[0]["error"].as_str().unwrap_or_default().to_string();

    let legacy_path = data_dir.join(LEGACY_FILE);
    let legacy_json = json!({
        "2025-06-01": [{ "transfer_id": "t", "amount_cents": 3000, "timestamp": "t" }]
    });
    fs::write(&legacy_path, legacy_json.to_string()).map_err(|e| GuardError::StorageFailed {
        path: legacy_path.display().to_string(),
        reason: e.to_string(),
    })?;
    let legacy_tracker = DailyLimitTracker::open_with_clock(&legacy_path, CEILING_CENTS, Box::new(clock))?;
    let legacy = legacy_tracker.check(5_000, &ActorKey::Global);

    let migrated_file = fs::read_to_string(&legacy_path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null);

    Ok(Outcome { partial, exhausted, stage_error, legacy, migrated_file })
}

fn show(check: &LimitCheck) -> String {
    format!("allowed={} remaining={}", check.allowed, check.remaining_cents)
}

/// Run Scenario 2 and print each step.
pub fn run_scenario(data_dir: &Path) -> GuardResult<()> {
    println!("=== Scenario 2: Daily Limit ===");
    println!();

    let outcome = run(data_dir)?;

    println!("  Ceiling: {} cents per actor per day", CEILING_CENTS);
    println!("  alice recorded 8000, check(5000)  → {}", show(&outcome.partial));
    println!("  bob recorded 10000,  check(1)     → {}", show(&outcome.exhausted));
    println!("  alice's agent stages $50.00       → {}", outcome.stage_error);
    println!("  legacy file loaded, check(5000)   → {}", show(&outcome.legacy));
    println!("  migrated on disk as: {}", outcome.migrated_file);
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
