//! Scenario 6: Message Rate Limit
//!
//! Each actor may start a bounded number of agent turns per sliding
//! window. A refused turn runs no tools and is not counted.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use podguard_contracts::{actor::Actor, error::GuardResult};
use podguard_core::{SystemClock, Throttle};
use podguard_tools::tool_name;

use crate::{config_for, MockPlatform, Runtime};

/// Turns each actor may start per window in this scenario.
pub const MAX_TURNS: usize = 3;

pub struct Outcome {
    /// `true` for each of Alice's turns that ran.
    pub alice: Vec<bool>,
    pub refusal: String,
    pub bob_admitted: bool,
}

pub fn run(data_dir: &Path) -> GuardResult<Outcome> {
    let mut config = config_for(data_dir);
    config.rate_limit.max_messages = MAX_TURNS;
    let runtime = Runtime::build(&config, Arc::new(MockPlatform::sample()), Throttle::disabled(), Arc::new(SystemClock))?;

    let alice = Actor::named("alice", "Alice");
    let bob = Actor::named("bob", "Bob");
    let calls = [(tool_name::GET_TOTAL_BALANCE, json!({}))];

    let mut admitted = Vec::new();
    let mut refusal = String::new();
    for _ in 0..MAX_TURNS + 2 {
        match runtime.agent_turn(&alice, &calls) {
            Ok(_) => admitted.push(true),
            Err(e) => {
                admitted.push(false);
                refusal = e.user_message();
            }
        }
    }
    let bob_admitted = runtime.agent_turn(&bob, &calls).is_ok();

    Ok(Outcome { alice: admitted, refusal, bob_admitted })
}

/// Run Scenario 6 and print each turn.
pub fn run_scenario(data_dir: &Path) -> GuardResult<()> {
    println!("=== Scenario 6: Message Rate Limit ===");
    println!();

    let outcome = run(data_dir)?;

    println!("  Limit: {} turns per actor per window", MAX_TURNS);
    for (i, ran) in outcome.alice.iter().enumerate() {
        println!("  alice turn {} → {}", i + 1, if *ran { "ran" } else { "refused" });
    }
    println!("  refusal message: {}", outcome.refusal);
    println!("  bob's first turn → {}", if outcome.bob_admitted { "ran" } else { "refused" });
    println!();
    println!("  Scenario 6 complete.");
    println!();

    Ok(())
}
