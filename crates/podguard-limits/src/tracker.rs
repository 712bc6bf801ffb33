//! The daily cumulative transfer limit.
//!
//! On-disk layout, one object per calendar day, keyed by actor:
//!
//! ```json
//! {
//!   "2024-03-01": {
//!     "__global__": [{"transfer_id": "t1", "amount_cents": 5000, "timestamp": "..."}],
//!     "42":         [ ... ]
//!   }
//! }
//! ```
//!
//! Files from older deployments that stored a flat list per day are migrated
//! on open, with every legacy entry charged to the global key. Days older
//! than two days before today are pruned on open.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use podguard_contracts::{
    actor::ActorKey,
    error::GuardResult,
    spend::{LimitCheck, SpendEntry},
};
use podguard_core::{
    clock::{Clock, SystemClock},
    traits::SpendLedger,
};
use podguard_store::JsonFile;

/// How many days before today are kept on open.
pub const RETAINED_DAYS: u64 = 2;

/// One day as it may appear on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayRecordFile {
    ByActor(BTreeMap<String, Vec<SpendEntry>>),
    /// The flat-list layout written before per-actor tracking existed.
    Legacy(Vec<SpendEntry>),
}

type StoredDays = BTreeMap<String, DayRecordFile>;
type DayTable = BTreeMap<NaiveDate, BTreeMap<ActorKey, Vec<SpendEntry>>>;

/// Tracks confirmed spend per day and actor, persisted write-through.
pub struct DailyLimitTracker {
    file: JsonFile<StoredDays>,
    max_daily_cents: i64,
    clock: Box<dyn Clock>,
    days: Mutex<DayTable>,
}

impl DailyLimitTracker {
    pub fn open(path: impl Into<PathBuf>, max_daily_cents: i64) -> GuardResult<Self> {
        Self::open_with_clock(path, max_daily_cents, Box::new(SystemClock))
    }

    /// Load, migrate and prune the ledger at `path`.
    ///
    /// A missing or corrupt file starts empty. The file is rewritten only if
    /// migration or pruning changed something.
    pub fn open_with_clock(
        path: impl Into<PathBuf>,
        max_daily_cents: i64,
        clock: Box<dyn Clock>,
    ) -> GuardResult<Self> {
        let file = JsonFile::new(path);
        let stored: StoredDays = file.load();

        let (mut days, mut changed) = migrate(stored);

        let today = clock.today();
        let cutoff = today.checked_sub_days(Days::new(RETAINED_DAYS)).unwrap_or(NaiveDate::MIN);
        let before = days.len();
        days.retain(|day, _| *day >= cutoff);
        if days.len() != before {
            info!(pruned = before - days.len(), cutoff = %cutoff, "pruned old daily limit records");
            changed = true;
        }

        let tracker = Self { file, max_daily_cents, clock, days: Mutex::new(days) };
        if changed {
            tracker.persist(&tracker.lock())?;
        }
        Ok(tracker)
    }

    /// Total recorded today for `actor`.
    pub fn used_today(&self, actor: &ActorKey) -> i64 {
        let today = self.clock.today();
        self.lock()
            .get(&today)
            .and_then(|by_actor| by_actor.get(actor))
            .map(|entries| entries.iter().map(|e| e.amount_cents).sum())
            .unwrap_or(0)
    }

    /// Today's entries for `actor`, in recording order.
    pub fn entries_today(&self, actor: &ActorKey) -> Vec<SpendEntry> {
        let today = self.clock.today();
        self.lock()
            .get(&today)
            .and_then(|by_actor| by_actor.get(actor))
            .cloned()
            .unwrap_or_default()
    }

    /// Every day currently held, oldest first.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.lock().keys().copied().collect()
    }

    fn lock(&self) -> MutexGuard<'_, DayTable> {
        self.days.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, days: &DayTable) -> GuardResult<()> {
        let stored: StoredDays = days
            .iter()
            .map(|(day, by_actor)| {
                let by_key = by_actor
                    .iter()
                    .map(|(actor, entries)| (actor.storage_key().to_string(), entries.clone()))
                    .collect();
                (day.format("%Y-%m-%d").to_string(), DayRecordFile::ByActor(by_key))
            })
            .collect();
        self.file.save(&stored)
    }
}

impl SpendLedger for DailyLimitTracker {
    fn check(&self, amount_cents: i64, actor: &ActorKey) -> LimitCheck {
        let used = self.used_today(actor);
        let remaining = self.max_daily_cents - used;
        debug!(actor = %actor, amount_cents, used, remaining, "daily limit check");
        LimitCheck { allowed: amount_cents <= remaining, remaining_cents: remaining }
    }

    fn record(&self, amount_cents: i64, transfer_id: &str, actor: &ActorKey) -> GuardResult<()> {
        let today = self.clock.today();
        let entry = SpendEntry {
            transfer_id: transfer_id.to_string(),
            amount_cents,
            timestamp: self.clock.now().to_rfc3339(),
        };

        let mut days = self.lock();
        days.entry(today).or_default().entry(actor.clone()).or_default().push(entry);
        // The in-memory entry stays even if the write fails: the transfer
        // has already executed and must keep counting for this process.
        self.persist(&days)?;

        info!(actor = %actor, transfer_id = %transfer_id, amount_cents, "recorded transfer against daily limit");
        Ok(())
    }

    fn max_daily_cents(&self) -> i64 {
        self.max_daily_cents
    }
}

/// Convert the stored layout to the in-memory one.
///
/// Returns whether anything had to change: a legacy day was rewritten or an
/// unparseable day key was dropped.
fn migrate(stored: StoredDays) -> (DayTable, bool) {
    let mut days = DayTable::new();
    let mut changed = false;

    for (key, record) in stored {
        let Ok(day) = NaiveDate::parse_from_str(&key, "%Y-%m-%d") else {
            warn!(key = %key, "dropping daily limit record with unparseable date");
            changed = true;
            continue;
        };
        let by_actor = days.entry(day).or_default();
        match record {
            DayRecordFile::ByActor(map) => {
                for (actor, entries) in map {
                    by_actor.entry(ActorKey::from_storage_key(&actor)).or_default().extend(entries);
                }
            }
            DayRecordFile::Legacy(entries) => {
                debug!(day = %day, count = entries.len(), "migrating legacy daily limit record");
                by_actor.entry(ActorKey::Global).or_default().extend(entries);
                changed = true;
            }
        }
    }

    (days, changed)
}
