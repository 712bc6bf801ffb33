//! Scenario 4: Expiry and Ownership
//!
//! A staged transfer belongs to whoever staged it and only lives for the
//! configured TTL. Expiry is lazy: nothing sweeps the table, the check runs
//! whenever someone tries to act on the transfer.
//!
//!   1. Bob cannot cancel or confirm Alice's transfer; it stays pending
//!   2. After the TTL, confirm reports "expired", then "not found"
//!   3. Confirming through the front-end path audits the expiry
//!   4. Alice can cancel her own transfer

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;

use podguard_contracts::{
    actor::Actor,
    error::GuardResult,
    transfer::TransferRequest,
};
use podguard_core::{ManualClock, Throttle};

use crate::{config_for, fixed_instant, MockPlatform, Runtime};

pub struct Outcome {
    pub foreign_cancel: String,
    pub foreign_confirm: String,
    pub still_pending_after_foreign: bool,
    pub first_late_confirm: String,
    pub second_late_confirm: String,
    pub late_complete: String,
    pub own_cancel: bool,
    pub audit_trail: Vec<String>,
}

fn message<T>(result: GuardResult<T>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.user_message(),
    }
}

pub fn run(data_dir: &Path) -> GuardResult<Outcome> {
    let clock = Arc::new(ManualClock::new(fixed_instant("2024-03-01T12:00:00Z")?));
    let config = config_for(data_dir);
    let ttl = Duration::seconds(config.safeguards.pending_transfer_ttl_secs as i64);
    let runtime = Runtime::build(&config, Arc::new(MockPlatform::sample()), Throttle::disabled(), clock.clone())?;
    let desk = &runtime.desk;

    let alice = Actor::named("alice", "Alice");
    let bob = Actor::named("bob", "Bob");
    let groceries = TransferRequest::new("Rent", "Groceries", 100.0).with_note("Weekly groceries");

    let first = desk.stage(&groceries, Some(&alice))?.pending_transfer_id;
    let foreign_cancel = message(desk.cancel(&first, Some(&bob)));
    let foreign_confirm = message(desk.complete(&first, Some(&bob)));
    let still_pending_after_foreign = desk.pending(&first).is_some();

    clock.advance(ttl + Duration::seconds(1));
    let first_late_confirm = message(desk.confirm(&first));
    let second_late_confirm = message(desk.confirm(&first));

    let second = desk.stage(&groceries, Some(&alice))?.pending_transfer_id;
    clock.advance(ttl + Duration::seconds(1));
    let late_complete = message(desk.complete(&second, Some(&alice)));

    let third = desk.stage(&groceries, Some(&alice))?.pending_transfer_id;
    let own_cancel = desk.cancel(&third, Some(&alice))?.success;

    Ok(Outcome {
        foreign_cancel,
        foreign_confirm,
        still_pending_after_foreign,
        first_late_confirm,
        second_late_confirm,
        late_complete,
        own_cancel,
        audit_trail: runtime.audit.read_all()?.into_iter().map(|e| e.event_type).collect(),
    })
}

/// Run Scenario 4 and print each step.
pub fn run_scenario(data_dir: &Path) -> GuardResult<()> {
    println!("=== Scenario 4: Expiry and Ownership ===");
    println!();

    let outcome = run(data_dir)?;

    println!("  Alice stages Rent → Groceries, $100.00");
    println!("  Bob cancels         → {}", outcome.foreign_cancel);
    println!("  Bob confirms        → {}", outcome.foreign_confirm);
    println!("  still pending       → {}", outcome.still_pending_after_foreign);
    println!("  (TTL elapses)");
    println!("  confirm             → {}", outcome.first_late_confirm);
    println!("  confirm again       → {}", outcome.second_late_confirm);
    println!("  Alice stages again, TTL elapses, presses [Confirm]");
    println!("                      → {}", outcome.late_complete);
    println!("  Alice stages again and presses [Cancel] → success={}", outcome.own_cancel);
    println!("  Audit trail: {}", outcome.audit_trail.join(" → "));
    println!();
    println!("  Scenario 4 complete.");
    println!();

    Ok(())
}
