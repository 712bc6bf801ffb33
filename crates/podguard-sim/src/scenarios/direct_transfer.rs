//! Scenario 5: Direct Transfer
//!
//! The single-operator path moves money between account ids in one call,
//! without staging. The per-transfer cap and the global daily limit still
//! apply, and platform failures are reported by kind: a business rejection
//! is shown verbatim, an upstream failure is masked.

use std::path::Path;
use std::sync::Arc;

use podguard_contracts::{
    account::AccountKind,
    actor::ActorKey,
    error::{GuardResult, PlatformError},
    transfer::TransferOrder,
};
use podguard_core::{SystemClock, Throttle};

use crate::{config_for, MockPlatform, Runtime};

pub struct Outcome {
    pub receipt_id: String,
    pub rejected: (u16, String),
    pub upstream: (u16, String),
    pub over_cap: (u16, String),
    pub global_spend: i64,
    pub audit_trail: Vec<String>,
}

fn order(amount_cents: i64, description: &str) -> TransferOrder {
    TransferOrder {
        source_id: "port-paycheck".to_string(),
        source_type: AccountKind::Port,
        destination_id: "pod-rent".to_string(),
        destination_type: AccountKind::Pod,
        amount_cents,
        description: description.to_string(),
        instant: true,
    }
}

fn failure(result: GuardResult<impl Sized>) -> (u16, String) {
    match result {
        Ok(_) => (200, "ok".to_string()),
        Err(e) => (e.http_status(), e.user_message()),
    }
}

pub fn run(data_dir: &Path) -> GuardResult<Outcome> {
    let config = config_for(data_dir);
    let platform = Arc::new(MockPlatform::sample());
    let runtime = Runtime::build(&config, platform.clone(), Throttle::disabled(), Arc::new(SystemClock))?;
    let desk = &runtime.desk;

    let receipt = desk.transfer_direct(&order(25_000, "Rent top-up"))?;

    platform.fail_next(PlatformError::Rejected("Transfer failed: destination pod is locked".to_string()));
    let rejected = failure(desk.transfer_direct(&order(1_000, "Blocked")));

    platform.fail_next(PlatformError::Upstream("HTTP 503 from upstream".to_string()));
    let upstream = failure(desk.transfer_direct(&order(1_000, "Retry later")));

    let over_cap = failure(desk.transfer_direct(&order(config.safeguards.max_transfer_cents + 1, "Too much")));

    Ok(Outcome {
        receipt_id: receipt.id,
        rejected,
        upstream,
        over_cap,
        global_spend: runtime.tracker.used_today(&ActorKey::Global),
        audit_trail: runtime.audit.read_all()?.into_iter().map(|e| e.event_type).collect(),
    })
}

/// Run Scenario 5 and print each step.
pub fn run_scenario(data_dir: &Path) -> GuardResult<()> {
    println!("=== Scenario 5: Direct Transfer ===");
    println!();

    let outcome = run(data_dir)?;

    println!("  Paycheck → Rent $250.00         → receipt {}", outcome.receipt_id);
    println!("  platform rejects                → {} {}", outcome.rejected.0, outcome.rejected.1);
    println!("  platform unreachable            → {} {}", outcome.upstream.0, outcome.upstream.1);
    println!("  over the per-transfer cap       → {} {}", outcome.over_cap.0, outcome.over_cap.1);
    println!("  global spend recorded today: {} cents", outcome.global_spend);
    println!("  Audit trail: {}", outcome.audit_trail.join(" → "));
    println!();
    println!("  Scenario 5 complete.");
    println!();

    Ok(())
}
