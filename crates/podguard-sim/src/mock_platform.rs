//! An in-memory stand-in for the banking platform.
//!
//! Balances really move when a transfer executes, and every executed
//! transfer lands in an activity history that the read-side calls filter.
//! All names and amounts are fictional. Nothing leaves the process.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use podguard_contracts::{
    account::{format_cents, Account, AccountKind, AccountSet},
    activity::{ActivityQuery, ActivityType, TransferDirection, TransferStatus},
    error::PlatformError,
    transfer::{TransferOrder, TransferReceipt},
};
use podguard_core::traits::PlatformClient;

/// One line of the simulated activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub amount_cents: i64,
    pub amount: String,
    pub description: String,
    pub direction: TransferDirection,
    pub status: TransferStatus,
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

struct Ledger {
    accounts: AccountSet,
    history: Vec<ActivityRecord>,
    next_id: u64,
}

pub struct MockPlatform {
    ledger: Mutex<Ledger>,
    failure: Mutex<Option<PlatformError>>,
}

/// A household with a handful of pods, one income port and one external
/// card.
pub fn sample_accounts() -> AccountSet {
    AccountSet {
        pods: vec![
            Account::new("pod-rent", "Rent", AccountKind::Pod, 120_000),
            Account::new("pod-groceries", "Groceries", AccountKind::Pod, 40_000),
            Account::new("pod-gas", "Gas", AccountKind::Pod, 5_000),
            Account::new("pod-emergency", "Emergency Savings", AccountKind::Pod, 2_000_000),
            Account::new("pod-vacation", "Vacation Savings", AccountKind::Pod, 150_000),
        ],
        ports: vec![Account::new("port-paycheck", "Paycheck", AccountKind::Port, 300_000)],
        accounts: vec![Account::new("acct-card", "Credit Card", AccountKind::Account, 0)],
    }
}

impl MockPlatform {
    pub fn new(accounts: AccountSet) -> Self {
        Self {
            ledger: Mutex::new(Ledger { accounts, history: Vec::new(), next_id: 1 }),
            failure: Mutex::new(None),
        }
    }

    pub fn sample() -> Self {
        Self::new(sample_accounts())
    }

    /// Make the next `execute_transfer` fail with `error` instead of moving
    /// money.
    pub fn fail_next(&self, error: PlatformError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Current balance of the pod or port called `name`.
    pub fn balance_of(&self, name: &str) -> Option<i64> {
        self.lock()
            .accounts
            .transfer_endpoints()
            .find(|a| a.name == name)
            .map(|a| a.balance_cents)
    }

    /// Every transfer executed so far, oldest first.
    pub fn history(&self) -> Vec<ActivityRecord> {
        self.lock().history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut<'a>(accounts: &'a mut AccountSet, id: &str, kind: AccountKind) -> Option<&'a mut Account> {
    let pool = match kind {
        AccountKind::Pod => &mut accounts.pods,
        AccountKind::Port => &mut accounts.ports,
        AccountKind::Account => &mut accounts.accounts,
    };
    pool.iter_mut().find(|a| a.id == id)
}

fn adjust(account: &mut Account, delta_cents: i64) {
    account.balance_cents += delta_cents;
    account.balance_display = format_cents(account.balance_cents);
}

impl PlatformClient for MockPlatform {
    fn fetch_accounts(&self) -> Result<AccountSet, PlatformError> {
        Ok(self.lock().accounts.clone())
    }

    fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError> {
        if let Some(error) = self.failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
            debug!(error = %error, "injected platform failure");
            return Err(error);
        }

        let mut ledger = self.lock();
        let ledger = &mut *ledger;

        let source = find_mut(&mut ledger.accounts, &order.source_id, order.source_type)
            .ok_or_else(|| PlatformError::Rejected(format!("Transfer failed: unknown source '{}'", order.source_id)))?;
        if source.balance_cents < order.amount_cents {
            return Err(PlatformError::Rejected(format!(
                "Transfer failed: insufficient funds in '{}'",
                source.name
            )));
        }
        let source_name = source.name.clone();

        let destination = find_mut(&mut ledger.accounts, &order.destination_id, order.destination_type)
            .ok_or_else(|| {
                PlatformError::Rejected(format!("Transfer failed: unknown destination '{}'", order.destination_id))
            })?;
        adjust(destination, order.amount_cents);
        let destination_name = destination.name.clone();

        // The source was found above and nothing has removed it since.
        if let Some(source) = find_mut(&mut ledger.accounts, &order.source_id, order.source_type) {
            adjust(source, -order.amount_cents);
        }

        let id = format!("xfer-{:04}", ledger.next_id);
        ledger.next_id += 1;
        ledger.history.push(ActivityRecord {
            id: id.clone(),
            source: source_name,
            destination: destination_name,
            amount_cents: order.amount_cents,
            amount: format_cents(order.amount_cents),
            description: order.description.clone(),
            direction: TransferDirection::Internal,
            status: TransferStatus::Complete,
            activity_type: ActivityType::OneTimeTransfer,
            created_at: Utc::now(),
        });

        info!(transfer_id = %id, amount_cents = order.amount_cents, "mock transfer executed");
        Ok(TransferReceipt { id, status: Some(TransferStatus::Complete.as_str().to_string()) })
    }

    fn pod_detail(&self, pod_id: &str) -> Result<Value, PlatformError> {
        let ledger = self.lock();
        let pod = ledger
            .accounts
            .pods
            .iter()
            .find(|p| p.id == pod_id)
            .ok_or_else(|| PlatformError::Rejected(format!("Pod '{}' not found.", pod_id)))?;
        let recent: Vec<&ActivityRecord> = ledger
            .history
            .iter()
            .rev()
            .filter(|r| r.source == pod.name || r.destination == pod.name)
            .take(5)
            .collect();
        Ok(json!({
            "pod": pod,
            "routing_number": "000000000",
            "recent_transfers": recent,
        }))
    }

    fn recent_activity(&self, query: &ActivityQuery) -> Result<Value, PlatformError> {
        let ledger = self.lock();
        let transfers: Vec<&ActivityRecord> = ledger
            .history
            .iter()
            .rev()
            .filter(|r| query.direction.map_or(true, |d| r.direction == d))
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .filter(|r| query.activity_type.map_or(true, |t| r.activity_type == t))
            .take(query.count as usize)
            .collect();
        Ok(json!({ "count": transfers.len(), "transfers": transfers }))
    }

    fn transfer_status(&self, transfer_id: &str) -> Result<Value, PlatformError> {
        let ledger = self.lock();
        let record = ledger
            .history
            .iter()
            .find(|r| r.id == transfer_id)
            .ok_or_else(|| PlatformError::Rejected(format!("Transfer '{}' not found.", transfer_id)))?;
        serde_json::to_value(record).map_err(|e| PlatformError::Upstream(e.to_string()))
    }

    fn activity_summary(&self) -> Result<Value, PlatformError> {
        let ledger = self.lock();
        let moved: i64 = ledger.history.iter().map(|r| r.amount_cents).sum();
        Ok(json!({
            "transfers_this_month": ledger.history.len(),
            "rule_executions": 0,
            "amount_moved": format_cents(moved),
            "money_in": format_cents(0),
        }))
    }
}
