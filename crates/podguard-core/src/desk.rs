//! The transfer desk: the two-phase stage/confirm protocol.
//!
//! Every transfer requested by an agent goes through the desk:
//!
//!   validate → limit check → resolve → funds check → audit → STAGED
//!   STAGED → confirm (execute) | cancel | expire
//!
//! The desk owns the pending-transfer table. Nothing reaches
//! `PlatformClient::execute_transfer` except through `confirm()` on a
//! transfer that passed every check in `stage()`, or through
//! `transfer_direct()` after the per-transfer and daily caps pass.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use tracing::{debug, error, info, warn};

use podguard_contracts::{
    account::{dollars_to_cents, Cents},
    actor::{Actor, ActorId, ActorKey},
    audit::{event_type, AuditEvent},
    error::{GuardError, GuardResult},
    transfer::{
        generate_transfer_id, CancelledTransfer, ConfirmedTransfer, PendingTransfer,
        StagedTransfer, TransferOrder, TransferReceipt, TransferRequest,
    },
};

use crate::clock::{Clock, SystemClock};
use crate::resolve::{resolve, ListHint};
use crate::traits::{AuditWriter, PlatformClient, SpendLedger};

/// Shown to the agent after a successful stage.
pub const STAGED_MESSAGE: &str =
    "Transfer staged. The user will confirm or cancel via buttons in the chat.";

/// Static per-deployment ceilings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskLimits {
    pub max_transfer_cents: i64,
    pub pending_ttl: Duration,
    pub max_note_chars: usize,
}

impl Default for DeskLimits {
    fn default() -> Self {
        Self {
            max_transfer_cents: 1_000_000,
            pending_ttl: Duration::seconds(300),
            max_note_chars: 100,
        }
    }
}

/// Owns the pending-transfer table and enforces the staging protocol.
///
/// Construct once per process and share it by reference; all methods take
/// `&self`.
pub struct TransferDesk {
    platform: Arc<dyn PlatformClient>,
    limits: DeskLimits,
    ledger: Option<Box<dyn SpendLedger>>,
    audit: Option<Box<dyn AuditWriter>>,
    clock: Box<dyn Clock>,
    pending: Mutex<HashMap<String, PendingTransfer>>,
}

impl TransferDesk {
    pub fn new(platform: Arc<dyn PlatformClient>, limits: DeskLimits) -> Self {
        Self {
            platform,
            limits,
            ledger: None,
            audit: None,
            clock: Box::new(SystemClock),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ledger(mut self, ledger: Box<dyn SpendLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_audit(mut self, audit: Box<dyn AuditWriter>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn platform(&self) -> &Arc<dyn PlatformClient> {
        &self.platform
    }

    pub fn limits(&self) -> &DeskLimits {
        &self.limits
    }

    /// A snapshot of one pending transfer.
    pub fn pending(&self, transfer_id: &str) -> Option<PendingTransfer> {
        self.table().get(transfer_id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.table().len()
    }

    // ── Stage ────────────────────────────────────────────────────────────────

    /// Validate a transfer request and hold it for explicit confirmation.
    ///
    /// Checks run in a fixed order and the first failure wins. No state
    /// changes and no audit entry is written unless every check passes.
    pub fn stage(
        &self,
        request: &TransferRequest,
        actor: Option<&Actor>,
    ) -> GuardResult<StagedTransfer> {
        let note_len = request.note.chars().count();
        if note_len > self.limits.max_note_chars {
            return Err(GuardError::NoteTooLong { len: note_len, max: self.limits.max_note_chars });
        }

        let amount_cents = dollars_to_cents(request.amount_dollars).ok_or(GuardError::InvalidAmount)?;

        if amount_cents > self.limits.max_transfer_cents {
            warn!(amount_cents, max = self.limits.max_transfer_cents, "transfer over per-transfer cap");
            return Err(GuardError::OverTransferLimit {
                amount: Cents(amount_cents),
                max: Cents(self.limits.max_transfer_cents),
            });
        }

        if let (Some(ledger), Some(actor)) = (&self.ledger, actor) {
            self.check_daily(ledger.as_ref(), amount_cents, &ActorKey::User(actor.id.clone()))?;
        }

        // Always a fresh fetch: balances must be live at staging time.
        let accounts = self.platform.fetch_accounts()?;
        let source = resolve(&request.source_name, accounts.transfer_endpoints()).into_result(
            "Source",
            &request.source_name,
            ListHint::Accounts,
        )?;
        let destination = resolve(&request.destination_name, accounts.transfer_endpoints())
            .into_result("Destination", &request.destination_name, ListHint::Accounts)?;

        if source.balance_cents < amount_cents {
            warn!(source = %source.name, available = source.balance_cents, amount_cents, "insufficient funds");
            return Err(GuardError::InsufficientFunds {
                account: source.name.clone(),
                available: source.balance_display.clone(),
                requested: Cents(amount_cents),
            });
        }

        let transfer_id = generate_transfer_id();
        let now = self.clock.now();
        let note = (!request.note.is_empty()).then(|| request.note.clone());
        let pending = PendingTransfer {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            source_type: source.kind,
            destination_id: destination.id.clone(),
            destination_name: destination.name.clone(),
            destination_type: destination.kind,
            amount_cents,
            amount_display: Cents(amount_cents).to_string(),
            note: note.clone(),
            created_at: now,
            owner: actor.map(|a| a.id.clone()),
        };

        // Audit before the entry becomes confirmable, so a failed audit write
        // never leaves an unrecorded pending transfer behind.
        self.emit(
            AuditEvent::new(event_type::TRANSFER_STAGED)
                .at(now)
                .actor(actor)
                .transfer_id(&transfer_id)
                .amount_cents(amount_cents)
                .source(&pending.source_name)
                .destination(&pending.destination_name)
                .note(note.as_deref()),
        )?;

        let staged = StagedTransfer {
            pending_transfer_id: transfer_id.clone(),
            source: pending.source_name.clone(),
            destination: pending.destination_name.clone(),
            amount: pending.amount_display.clone(),
            note,
            message: STAGED_MESSAGE.to_string(),
        };

        info!(
            transfer_id = %transfer_id,
            source = %staged.source,
            destination = %staged.destination,
            amount = %staged.amount,
            "transfer staged"
        );

        self.table().insert(transfer_id, pending);
        Ok(staged)
    }

    // ── Confirm ──────────────────────────────────────────────────────────────

    /// Execute a staged transfer.
    ///
    /// The entry is taken out of the table before the platform is called, so
    /// a duplicate confirm finds nothing and can never execute twice. Any
    /// outcome consumes the entry. Recording spend and auditing is the
    /// caller's job; see [`TransferDesk::complete`].
    pub fn confirm(&self, transfer_id: &str) -> GuardResult<ConfirmedTransfer> {
        let transfer = self.table().remove(transfer_id).ok_or(GuardError::TransferNotFound)?;

        if transfer.is_expired(self.clock.now(), self.limits.pending_ttl) {
            warn!(transfer_id = %transfer_id, "pending transfer expired");
            return Err(GuardError::TransferExpired);
        }

        debug!(transfer_id = %transfer_id, "executing staged transfer");
        let receipt = self.platform.execute_transfer(&transfer.to_order()).map_err(|e| {
            warn!(transfer_id = %transfer_id, error = %e, "platform refused transfer");
            GuardError::Platform(e)
        })?;

        info!(
            transfer_id = %transfer_id,
            receipt_id = %receipt.id,
            source = %transfer.source_name,
            destination = %transfer.destination_name,
            amount = %transfer.amount_display,
            "transfer executed"
        );

        Ok(ConfirmedTransfer {
            success: true,
            transfer_id: transfer_id.to_string(),
            source: transfer.source_name,
            destination: transfer.destination_name,
            amount: transfer.amount_display,
            amount_cents: transfer.amount_cents,
            receipt,
        })
    }

    // ── Cancel ───────────────────────────────────────────────────────────────

    /// Discard a staged transfer.
    ///
    /// A caller that does not own the transfer gets `NotOwner` and the entry
    /// stays put.
    pub fn cancel(&self, transfer_id: &str, actor: Option<&Actor>) -> GuardResult<CancelledTransfer> {
        let mut table = self.table();
        let transfer = table.get(transfer_id).ok_or(GuardError::TransferNotFound)?;

        if transfer.is_foreign_to(actor.map(|a| &a.id)) {
            warn!(transfer_id = %transfer_id, "cancel attempted by non-owner");
            return Err(GuardError::NotOwner);
        }

        self.emit(
            AuditEvent::new(event_type::TRANSFER_CANCELLED)
                .at(self.clock.now())
                .actor(actor)
                .transfer_id(transfer_id)
                .amount_cents(transfer.amount_cents)
                .source(&transfer.source_name)
                .destination(&transfer.destination_name),
        )?;

        let transfer = table.remove(transfer_id).ok_or(GuardError::TransferNotFound)?;
        info!(transfer_id = %transfer_id, "transfer cancelled");

        Ok(CancelledTransfer {
            success: true,
            cancelled: transfer_id.to_string(),
            source: transfer.source_name,
            destination: transfer.destination_name,
            amount: transfer.amount_display,
        })
    }

    // ── Complete ─────────────────────────────────────────────────────────────

    /// The full confirm sequence a front-end runs when a human presses
    /// "Confirm".
    ///
    /// # Pipeline
    ///
    /// 1. Ownership check; a non-owner leaves the entry untouched
    /// 2. Expiry check; audits `transfer_expired` and drops the entry
    /// 3. Daily limit re-check, since other transfers may have settled
    ///    since staging
    /// 4. `confirm()`; audits `transfer_failed` on a platform error
    /// 5. Record the spend and audit `transfer_confirmed`
    pub fn complete(&self, transfer_id: &str, actor: Option<&Actor>) -> GuardResult<ConfirmedTransfer> {
        let transfer = self.pending(transfer_id).ok_or(GuardError::TransferNotFound)?;

        if transfer.is_foreign_to(actor.map(|a| &a.id)) {
            warn!(transfer_id = %transfer_id, "confirm attempted by non-owner");
            return Err(GuardError::NotOwner);
        }

        let now = self.clock.now();
        if transfer.is_expired(now, self.limits.pending_ttl) {
            self.table().remove(transfer_id);
            warn!(transfer_id = %transfer_id, "pending transfer expired before confirmation");
            self.emit(
                AuditEvent::new(event_type::TRANSFER_EXPIRED)
                    .at(now)
                    .actor(actor)
                    .transfer_id(transfer_id),
            )?;
            return Err(GuardError::TransferExpired);
        }

        let key = spend_key(&transfer, actor);
        if let Some(ledger) = &self.ledger {
            self.check_daily(ledger.as_ref(), transfer.amount_cents, &key)?;
        }

        let confirmed = match self.confirm(transfer_id) {
            Ok(confirmed) => confirmed,
            Err(GuardError::Platform(e)) => {
                self.emit(
                    AuditEvent::new(event_type::TRANSFER_FAILED)
                        .at(self.clock.now())
                        .actor(actor)
                        .transfer_id(transfer_id)
                        .amount_cents(transfer.amount_cents)
                        .error(e.message()),
                )?;
                return Err(GuardError::Platform(e));
            }
            Err(other) => return Err(other),
        };

        // The money has moved. Attempt both bookkeeping steps before
        // surfacing a ledger failure.
        let recorded = match &self.ledger {
            Some(ledger) => ledger.record(confirmed.amount_cents, transfer_id, &key),
            None => Ok(()),
        };
        if let Err(e) = &recorded {
            error!(transfer_id = %transfer_id, error = %e, "failed to record confirmed spend");
        }

        self.emit(
            AuditEvent::new(event_type::TRANSFER_CONFIRMED)
                .at(self.clock.now())
                .actor(actor)
                .transfer_id(transfer_id)
                .amount_cents(confirmed.amount_cents)
                .source(&confirmed.source)
                .destination(&confirmed.destination),
        )?;
        recorded?;

        Ok(confirmed)
    }

    // ── Direct transfer ──────────────────────────────────────────────────────

    /// One-shot transfer between account ids, without staging.
    ///
    /// Used by single-operator surfaces with no per-caller identity, so the
    /// daily limit is always checked and recorded against the global key.
    pub fn transfer_direct(&self, order: &TransferOrder) -> GuardResult<TransferReceipt> {
        if order.amount_cents <= 0 {
            return Err(GuardError::InvalidAmount);
        }
        if order.amount_cents > self.limits.max_transfer_cents {
            warn!(amount_cents = order.amount_cents, "direct transfer over per-transfer cap");
            return Err(GuardError::OverTransferLimit {
                amount: Cents(order.amount_cents),
                max: Cents(self.limits.max_transfer_cents),
            });
        }
        if let Some(ledger) = &self.ledger {
            self.check_daily(ledger.as_ref(), order.amount_cents, &ActorKey::Global)?;
        }

        self.emit(
            AuditEvent::new(event_type::TRANSFER_REQUESTED)
                .at(self.clock.now())
                .amount_cents(order.amount_cents)
                .source(&order.source_id)
                .destination(&order.destination_id)
                .note(Some(order.description.as_str())),
        )?;

        let receipt = match self.platform.execute_transfer(order) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "direct transfer failed");
                self.emit(
                    AuditEvent::new(event_type::TRANSFER_FAILED)
                        .at(self.clock.now())
                        .amount_cents(order.amount_cents)
                        .source(&order.source_id)
                        .destination(&order.destination_id)
                        .error(e.message()),
                )?;
                return Err(GuardError::Platform(e));
            }
        };

        let recorded = match &self.ledger {
            Some(ledger) => ledger.record(order.amount_cents, &receipt.id, &ActorKey::Global),
            None => Ok(()),
        };
        if let Err(e) = &recorded {
            error!(receipt_id = %receipt.id, error = %e, "failed to record direct transfer spend");
        }

        self.emit(
            AuditEvent::new(event_type::TRANSFER_COMPLETED)
                .at(self.clock.now())
                .transfer_id(&receipt.id)
                .amount_cents(order.amount_cents)
                .source(&order.source_id)
                .destination(&order.destination_id),
        )?;
        recorded?;

        info!(receipt_id = %receipt.id, amount_cents = order.amount_cents, "direct transfer completed");
        Ok(receipt)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn table(&self) -> MutexGuard<'_, HashMap<String, PendingTransfer>> {
        // Every critical section leaves the table consistent, so a poisoned
        // lock still guards valid data.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_daily(&self, ledger: &dyn SpendLedger, amount_cents: i64, key: &ActorKey) -> GuardResult<()> {
        let check = ledger.check(amount_cents, key);
        if check.allowed {
            return Ok(());
        }
        let limit = ledger.max_daily_cents();
        warn!(
            actor = %key,
            amount_cents,
            remaining_cents = check.remaining_cents,
            "daily limit would be exceeded"
        );
        Err(GuardError::DailyLimitExceeded {
            limit: Cents(limit),
            used: Cents(limit - check.remaining_cents),
            remaining: Cents(check.remaining_cents),
        })
    }

    fn emit(&self, event: AuditEvent) -> GuardResult<()> {
        match &self.audit {
            Some(audit) => audit.log(event),
            None => Ok(()),
        }
    }
}

/// Spend is charged to the transfer's owner, falling back to whoever
/// confirms it, falling back to the global key.
fn spend_key(transfer: &PendingTransfer, actor: Option<&Actor>) -> ActorKey {
    let id: Option<&ActorId> = transfer.owner.as_ref().or(actor.map(|a| &a.id));
    ActorKey::for_actor(id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;

    use podguard_contracts::{
        account::{Account, AccountKind, AccountSet},
        activity::ActivityQuery,
        actor::{Actor, ActorKey},
        audit::{event_type, AuditEvent},
        error::{GuardError, GuardResult, PlatformError},
        spend::LimitCheck,
        transfer::{TransferOrder, TransferReceipt, TransferRequest},
    };

    use crate::clock::ManualClock;
    use crate::traits::{AuditWriter, PlatformClient, SpendLedger};

    use super::{DeskLimits, TransferDesk};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A platform with fixed accounts that records every executed order.
    struct MockPlatform {
        accounts: AccountSet,
        fetches: Mutex<usize>,
        executed: Mutex<Vec<TransferOrder>>,
        failure: Mutex<Option<PlatformError>>,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                accounts: AccountSet {
                    pods: vec![
                        Account::new("pod-rent", "Rent", AccountKind::Pod, 120_000),
                        Account::new("pod-groc", "Groceries", AccountKind::Pod, 40_000),
                        Account::new("pod-gas", "Gas", AccountKind::Pod, 5_000),
                        Account::new("pod-save", "Savings", AccountKind::Pod, 2_000_000),
                    ],
                    ports: vec![Account::new("port-pay", "Paycheck", AccountKind::Port, 300_000)],
                    accounts: vec![Account::new("ext-1", "Checking", AccountKind::Account, 0)],
                },
                fetches: Mutex::new(0),
                executed: Mutex::new(vec![]),
                failure: Mutex::new(None),
            }
        }

        fn fail_next(&self, error: PlatformError) {
            *self.failure.lock().unwrap() = Some(error);
        }

        fn executed(&self) -> Vec<TransferOrder> {
            self.executed.lock().unwrap().clone()
        }

        fn fetches(&self) -> usize {
            *self.fetches.lock().unwrap()
        }
    }

    impl PlatformClient for MockPlatform {
        fn fetch_accounts(&self) -> Result<AccountSet, PlatformError> {
            *self.fetches.lock().unwrap() += 1;
            Ok(self.accounts.clone())
        }

        fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError> {
            if let Some(e) = self.failure.lock().unwrap().take() {
                return Err(e);
            }
            let mut executed = self.executed.lock().unwrap();
            executed.push(order.clone());
            Ok(TransferReceipt { id: format!("xfer-{}", executed.len()), status: None })
        }

        fn pod_detail(&self, _pod_id: &str) -> Result<Value, PlatformError> {
            Ok(Value::Null)
        }

        fn recent_activity(&self, _query: &ActivityQuery) -> Result<Value, PlatformError> {
            Ok(Value::Null)
        }

        fn transfer_status(&self, _transfer_id: &str) -> Result<Value, PlatformError> {
            Ok(Value::Null)
        }

        fn activity_summary(&self) -> Result<Value, PlatformError> {
            Ok(Value::Null)
        }
    }

    /// An in-memory ledger with a fixed ceiling.
    struct MockLedger {
        max: i64,
        used: Mutex<HashMap<ActorKey, i64>>,
        records: Mutex<Vec<(i64, String, ActorKey)>>,
    }

    impl MockLedger {
        fn new(max: i64) -> Self {
            Self { max, used: Mutex::new(HashMap::new()), records: Mutex::new(vec![]) }
        }

        fn preload(&self, key: ActorKey, cents: i64) {
            *self.used.lock().unwrap().entry(key).or_default() += cents;
        }

        fn records(&self) -> Vec<(i64, String, ActorKey)> {
            self.records.lock().unwrap().clone()
        }
    }

    impl SpendLedger for MockLedger {
        fn check(&self, amount_cents: i64, actor: &ActorKey) -> LimitCheck {
            let used = self.used.lock().unwrap().get(actor).copied().unwrap_or(0);
            let remaining = self.max - used;
            LimitCheck { allowed: amount_cents <= remaining, remaining_cents: remaining }
        }

        fn record(&self, amount_cents: i64, transfer_id: &str, actor: &ActorKey) -> GuardResult<()> {
            self.preload(actor.clone(), amount_cents);
            self.records.lock().unwrap().push((amount_cents, transfer_id.to_string(), actor.clone()));
            Ok(())
        }

        fn max_daily_cents(&self) -> i64 {
            self.max
        }
    }

    /// An audit writer that keeps every event for inspection.
    #[derive(Default)]
    struct MockAudit {
        events: Mutex<Vec<AuditEvent>>,
    }

    impl MockAudit {
        fn types(&self) -> Vec<String> {
            self.events.lock().unwrap().iter().map(|e| e.event_type.clone()).collect()
        }

        fn last(&self) -> AuditEvent {
            self.events.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl AuditWriter for MockAudit {
        fn log(&self, event: AuditEvent) -> GuardResult<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// An audit writer whose disk is always full.
    struct BrokenAudit;

    impl AuditWriter for BrokenAudit {
        fn log(&self, _event: AuditEvent) -> GuardResult<()> {
            Err(GuardError::AuditWriteFailed { reason: "disk full".to_string() })
        }
    }

    struct Harness {
        desk: TransferDesk,
        platform: Arc<MockPlatform>,
        ledger: Arc<MockLedger>,
        audit: Arc<MockAudit>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let platform = Arc::new(MockPlatform::new());
        let ledger = Arc::new(MockLedger::new(2_500_000));
        let audit = Arc::new(MockAudit::default());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
        let desk = TransferDesk::new(platform.clone(), DeskLimits::default())
            .with_ledger(Box::new(ledger.clone()))
            .with_audit(Box::new(audit.clone()))
            .with_clock(Box::new(clock.clone()));
        Harness { desk, platform, ledger, audit, clock }
    }

    fn alice() -> Actor {
        Actor::named("alice", "Alice")
    }

    fn bob() -> Actor {
        Actor::named("bob", "Bob")
    }

    // ── Stage ────────────────────────────────────────────────────────────────

    #[test]
    fn test_stage_holds_transfer_and_audits() {
        let h = harness();
        let staged = h
            .desk
            .stage(&TransferRequest::new("rent", "savings", 50.0).with_note("March"), Some(&alice()))
            .unwrap();

        assert_eq!(staged.source, "Rent");
        assert_eq!(staged.destination, "Savings");
        assert_eq!(staged.amount, "$50.00");
        assert_eq!(staged.note.as_deref(), Some("March"));
        assert_eq!(h.desk.pending_count(), 1);
        assert!(h.platform.executed().is_empty(), "staging must never execute");

        let pending = h.desk.pending(&staged.pending_transfer_id).unwrap();
        assert_eq!(pending.amount_cents, 5_000);
        assert_eq!(pending.owner, Some(alice().id));

        let event = h.audit.last();
        assert_eq!(event.event_type, event_type::TRANSFER_STAGED);
        assert_eq!(event.transfer_id.as_deref(), Some(staged.pending_transfer_id.as_str()));
        assert_eq!(event.user_name.as_deref(), Some("Alice"));
        assert_eq!(event.note.as_deref(), Some("March"));
    }

    #[test]
    fn test_stage_omits_empty_note() {
        let h = harness();
        let staged = h.desk.stage(&TransferRequest::new("Rent", "Gas", 1.0), None).unwrap();
        assert!(staged.note.is_none());
        assert!(h.audit.last().note.is_none());
    }

    #[test]
    fn test_stage_rejects_long_note_before_anything_else() {
        let h = harness();
        let request = TransferRequest::new("Rent", "Savings", 50.0).with_note("x".repeat(101));
        let err = h.desk.stage(&request, None).unwrap_err();
        assert!(matches!(err, GuardError::NoteTooLong { len: 101, max: 100 }));
        assert_eq!(h.platform.fetches(), 0);
        assert_eq!(h.desk.pending_count(), 0);
        assert!(h.audit.types().is_empty());

        let exactly = TransferRequest::new("Rent", "Savings", 50.0).with_note("x".repeat(100));
        assert!(h.desk.stage(&exactly, None).is_ok());
    }

    #[test]
    fn test_stage_rejects_non_positive_amounts() {
        let h = harness();
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, 0.001] {
            let err = h.desk.stage(&TransferRequest::new("Rent", "Savings", amount), None).unwrap_err();
            assert!(matches!(err, GuardError::InvalidAmount), "amount {amount} gave {err:?}");
        }
        assert_eq!(h.platform.fetches(), 0);
    }

    #[test]
    fn test_stage_rejects_amount_over_cap() {
        let h = harness();
        let err = h
            .desk
            .stage(&TransferRequest::new("Savings", "Rent", 10_000.01), None)
            .unwrap_err();
        assert!(matches!(err, GuardError::OverTransferLimit { .. }));
        assert!(err.to_string().contains("$10,000.00"), "got: {err}");

        // Exactly at the cap is allowed.
        assert!(h.desk.stage(&TransferRequest::new("Savings", "Rent", 10_000.0), None).is_ok());
    }

    #[test]
    fn test_stage_checks_daily_limit_only_with_actor() {
        let h = harness();
        h.ledger.preload(ActorKey::User(alice().id), 2_400_000);

        let err = h
            .desk
            .stage(&TransferRequest::new("Savings", "Rent", 2_000.0), Some(&alice()))
            .unwrap_err();
        match &err {
            GuardError::DailyLimitExceeded { remaining, .. } => assert_eq!(remaining.0, 100_000),
            other => panic!("expected DailyLimitExceeded, got {other:?}"),
        }
        assert!(err.to_string().contains("Remaining: $1,000.00"), "got: {err}");
        assert_eq!(h.platform.fetches(), 0);

        // Anonymous staging skips the stage-time check.
        assert!(h.desk.stage(&TransferRequest::new("Savings", "Rent", 2_000.0), None).is_ok());
    }

    #[test]
    fn test_stage_ambiguous_destination_stages_nothing() {
        let h = harness();
        // "g" matches Groceries, Gas and Savings.
        let err = h.desk.stage(&TransferRequest::new("Rent", "g", 5.0), None).unwrap_err();
        match &err {
            GuardError::AmbiguousAccount { role, candidates, .. } => {
                assert_eq!(role, "Destination");
                assert_eq!(candidates, &vec!["Groceries", "Gas", "Savings"]);
            }
            other => panic!("expected AmbiguousAccount, got {other:?}"),
        }
        assert_eq!(h.desk.pending_count(), 0);
        assert!(h.audit.types().is_empty());
    }

    #[test]
    fn test_stage_unknown_source_suggests_listing() {
        let h = harness();
        let err = h.desk.stage(&TransferRequest::new("Boat", "Rent", 5.0), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Source 'Boat' not found. Try using get_all_accounts to see available accounts."
        );
    }

    #[test]
    fn test_stage_port_can_be_source_but_external_account_cannot() {
        let h = harness();
        assert!(h.desk.stage(&TransferRequest::new("Paycheck", "Rent", 5.0), None).is_ok());
        let err = h.desk.stage(&TransferRequest::new("Checking", "Rent", 5.0), None).unwrap_err();
        assert!(matches!(err, GuardError::AccountNotFound { .. }));
    }

    #[test]
    fn test_stage_rejects_insufficient_funds() {
        let h = harness();
        let err = h.desk.stage(&TransferRequest::new("Gas", "Rent", 50.01), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient balance in 'Gas'. Available: $50.00, requested: $50.01."
        );
        assert_eq!(h.desk.pending_count(), 0);
    }

    #[test]
    fn test_stage_audit_failure_leaves_no_pending_transfer() {
        let platform = Arc::new(MockPlatform::new());
        let desk = TransferDesk::new(platform, DeskLimits::default()).with_audit(Box::new(BrokenAudit));
        let err = desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap_err();
        assert!(matches!(err, GuardError::AuditWriteFailed { .. }));
        assert_eq!(desk.pending_count(), 0);
    }

    // ── Confirm ──────────────────────────────────────────────────────────────

    #[test]
    fn test_confirm_executes_exactly_once() {
        let h = harness();
        let staged = h.desk.stage(&TransferRequest::new("Rent", "Savings", 50.0), None).unwrap();
        let id = staged.pending_transfer_id;

        let confirmed = h.desk.confirm(&id).unwrap();
        assert!(confirmed.success);
        assert_eq!(confirmed.amount_cents, 5_000);
        assert_eq!(confirmed.receipt.id, "xfer-1");

        let again = h.desk.confirm(&id).unwrap_err();
        assert!(matches!(again, GuardError::TransferNotFound));
        assert_eq!(h.platform.executed().len(), 1, "duplicate confirm must not re-execute");

        let order = &h.platform.executed()[0];
        assert_eq!(order.source_id, "pod-rent");
        assert_eq!(order.destination_id, "pod-save");
        assert_eq!(order.source_type, AccountKind::Pod);
    }

    #[test]
    fn test_confirm_at_ttl_boundary() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.clock.advance(Duration::seconds(300));
        assert!(h.desk.confirm(&id).is_ok(), "exactly at the TTL is still confirmable");
    }

    #[test]
    fn test_confirm_after_ttl_is_expired_then_gone() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.clock.advance(Duration::seconds(301));

        assert!(matches!(h.desk.confirm(&id).unwrap_err(), GuardError::TransferExpired));
        assert!(matches!(h.desk.confirm(&id).unwrap_err(), GuardError::TransferNotFound));
        assert!(h.platform.executed().is_empty());
    }

    #[test]
    fn test_confirm_platform_failure_consumes_entry() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.platform.fail_next(PlatformError::Rejected("Transfer failed: account frozen".to_string()));

        let err = h.desk.confirm(&id).unwrap_err();
        assert_eq!(err.user_message(), "Transfer failed: account frozen");
        assert_eq!(h.desk.pending_count(), 0, "failed transfers must be re-staged");
    }

    // ── Cancel ───────────────────────────────────────────────────────────────

    #[test]
    fn test_cancel_by_non_owner_is_refused() {
        let h = harness();
        let id = h
            .desk
            .stage(&TransferRequest::new("Rent", "Savings", 5.0), Some(&alice()))
            .unwrap()
            .pending_transfer_id;

        assert!(matches!(h.desk.cancel(&id, Some(&bob())).unwrap_err(), GuardError::NotOwner));
        assert!(h.desk.pending(&id).is_some(), "refused cancel must leave the entry");

        let cancelled = h.desk.cancel(&id, Some(&alice())).unwrap();
        assert_eq!(cancelled.cancelled, id);
        assert_eq!(h.desk.pending_count(), 0);
        assert_eq!(h.audit.last().event_type, event_type::TRANSFER_CANCELLED);
    }

    #[test]
    fn test_cancel_anonymous_skips_ownership() {
        let h = harness();
        let id = h
            .desk
            .stage(&TransferRequest::new("Rent", "Savings", 5.0), Some(&alice()))
            .unwrap()
            .pending_transfer_id;
        assert!(h.desk.cancel(&id, None).is_ok());
    }

    #[test]
    fn test_cancel_unknown_id() {
        let h = harness();
        assert!(matches!(h.desk.cancel("nope", None).unwrap_err(), GuardError::TransferNotFound));
    }

    // ── Complete ─────────────────────────────────────────────────────────────

    #[test]
    fn test_complete_records_spend_and_audits() {
        let h = harness();
        let id = h
            .desk
            .stage(&TransferRequest::new("Rent", "Savings", 50.0), Some(&alice()))
            .unwrap()
            .pending_transfer_id;

        let confirmed = h.desk.complete(&id, Some(&alice())).unwrap();
        assert_eq!(confirmed.transfer_id, id);
        assert_eq!(h.ledger.records(), vec![(5_000, id.clone(), ActorKey::User(alice().id))]);
        assert_eq!(
            h.audit.types(),
            vec![event_type::TRANSFER_STAGED, event_type::TRANSFER_CONFIRMED]
        );
    }

    #[test]
    fn test_complete_by_non_owner_leaves_entry() {
        let h = harness();
        let id = h
            .desk
            .stage(&TransferRequest::new("Rent", "Savings", 5.0), Some(&alice()))
            .unwrap()
            .pending_transfer_id;
        assert!(matches!(h.desk.complete(&id, Some(&bob())).unwrap_err(), GuardError::NotOwner));
        assert!(h.desk.pending(&id).is_some());
        assert!(h.platform.executed().is_empty());
    }

    #[test]
    fn test_complete_after_expiry_audits_expired() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.clock.advance(Duration::minutes(10));

        assert!(matches!(h.desk.complete(&id, None).unwrap_err(), GuardError::TransferExpired));
        assert_eq!(h.audit.last().event_type, event_type::TRANSFER_EXPIRED);
        assert_eq!(h.desk.pending_count(), 0);
        assert!(h.ledger.records().is_empty());
    }

    #[test]
    fn test_complete_rechecks_daily_limit() {
        let h = harness();
        let id = h
            .desk
            .stage(&TransferRequest::new("Savings", "Rent", 2_000.0), Some(&alice()))
            .unwrap()
            .pending_transfer_id;

        // Another transfer settles between stage and confirm.
        h.ledger.preload(ActorKey::User(alice().id), 2_400_000);

        let err = h.desk.complete(&id, Some(&alice())).unwrap_err();
        assert!(matches!(err, GuardError::DailyLimitExceeded { .. }));
        assert!(h.platform.executed().is_empty());
    }

    #[test]
    fn test_complete_failure_audits_and_records_nothing() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.platform.fail_next(PlatformError::Upstream("503 from gateway".to_string()));

        let err = h.desk.complete(&id, None).unwrap_err();
        assert_eq!(err.user_message(), GuardError::GENERIC_FAILURE);
        assert_eq!(err.http_status(), 502);

        let event = h.audit.last();
        assert_eq!(event.event_type, event_type::TRANSFER_FAILED);
        assert_eq!(event.error.as_deref(), Some("503 from gateway"));
        assert!(h.ledger.records().is_empty());
    }

    #[test]
    fn test_complete_anonymous_records_global() {
        let h = harness();
        let id = h.desk.stage(&TransferRequest::new("Rent", "Savings", 5.0), None).unwrap().pending_transfer_id;
        h.desk.complete(&id, None).unwrap();
        assert_eq!(h.ledger.records()[0].2, ActorKey::Global);
    }

    // ── Direct transfer ──────────────────────────────────────────────────────

    fn order(amount_cents: i64) -> TransferOrder {
        TransferOrder {
            source_id: "pod-save".to_string(),
            source_type: AccountKind::Pod,
            destination_id: "pod-rent".to_string(),
            destination_type: AccountKind::Pod,
            amount_cents,
            description: String::new(),
            instant: false,
        }
    }

    #[test]
    fn test_direct_transfer_records_under_receipt_id() {
        let h = harness();
        let receipt = h.desk.transfer_direct(&order(10_000)).unwrap();
        assert_eq!(h.ledger.records(), vec![(10_000, receipt.id.clone(), ActorKey::Global)]);
        assert_eq!(
            h.audit.types(),
            vec![event_type::TRANSFER_REQUESTED, event_type::TRANSFER_COMPLETED]
        );
    }

    #[test]
    fn test_direct_transfer_enforces_caps() {
        let h = harness();
        assert!(matches!(
            h.desk.transfer_direct(&order(1_000_001)).unwrap_err(),
            GuardError::OverTransferLimit { .. }
        ));

        h.ledger.preload(ActorKey::Global, 2_000_000);
        let err = h.desk.transfer_direct(&order(600_000)).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(matches!(err, GuardError::DailyLimitExceeded { .. }));
        assert!(h.platform.executed().is_empty());
        assert!(h.audit.types().is_empty(), "refused requests are not audited");
    }

    #[test]
    fn test_direct_transfer_failure_is_audited() {
        let h = harness();
        h.platform.fail_next(PlatformError::classify("Transfer failed: insufficient funds"));
        let err = h.desk.transfer_direct(&order(5_000)).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(
            h.audit.types(),
            vec![event_type::TRANSFER_REQUESTED, event_type::TRANSFER_FAILED]
        );
        assert!(h.ledger.records().is_empty());
    }
}
