//! Scenario 3: Account Resolution
//!
//! Names typed by a person or a model are resolved against live accounts:
//! an exact case-insensitive match wins, otherwise a substring must match
//! exactly one account. Anything else is refused with a hint, and the
//! transfer is never staged.

use std::sync::Arc;

use podguard_contracts::{
    account::{Account, AccountKind},
    error::GuardResult,
    transfer::TransferRequest,
};
use podguard_core::{
    resolve::{resolve, ListHint, Resolution},
    DeskLimits, TransferDesk,
};

use crate::MockPlatform;

pub struct Outcome {
    /// `(query, outcome)` pairs against the shared-household account list.
    pub lookups: Vec<(String, String)>,
    pub ambiguous_stage: String,
    pub pending_after: usize,
}

fn household() -> Vec<Account> {
    vec![
        Account::new("pod-1", "Alice's Groceries", AccountKind::Pod, 10_000),
        Account::new("pod-2", "Alice's Savings", AccountKind::Pod, 50_000),
        Account::new("pod-3", "Bob's Savings", AccountKind::Pod, 70_000),
    ]
}

fn describe(resolution: Resolution<'_>, query: &str) -> String {
    resolution
        .into_result("Pod", query, ListHint::Pods)
        .map(|account| format!("found {}", account.name))
        .unwrap_or_else(|e| e.to_string())
}

pub fn run() -> Outcome {
    let accounts = household();
    let lookups = ["savings", "bob", "ALICE'S SAVINGS", "checking"]
        .iter()
        .map(|q| (q.to_string(), describe(resolve(q, &accounts), q)))
        .collect();

    let platform = Arc::new(MockPlatform::sample());
    let desk = TransferDesk::new(platform, DeskLimits::default());
    let ambiguous_stage = match desk.stage(&TransferRequest::new("Savings", "Rent", 10.0), None) {
        Ok(staged) => format!("staged {}", staged.pending_transfer_id),
        Err(e) => e.user_message(),
    };

    Outcome { lookups, ambiguous_stage, pending_after: desk.pending_count() }
}

/// Run Scenario 3 and print each lookup.
pub fn run_scenario() -> GuardResult<()> {
    println!("=== Scenario 3: Account Resolution ===");
    println!();

    let outcome = run();

    println!("  Accounts: Alice's Groceries, Alice's Savings, Bob's Savings");
    for (query, result) in &outcome.lookups {
        println!("  resolve({:?}) → {}", query, result);
    }
    println!();
    println!("  stage Savings → Rent $10.00 → {}", outcome.ambiguous_stage);
    println!("  pending transfers afterwards: {}", outcome.pending_after);
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
