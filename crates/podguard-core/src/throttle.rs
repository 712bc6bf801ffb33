//! Client-side pacing of remote platform calls.
//!
//! The platform's backend is a consumer web app, not a bulk API. Requests
//! are spaced by a minimum delay plus random jitter so traffic never looks
//! like a tight loop. The first request after construction never waits.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::Value;
use tracing::debug;

use podguard_contracts::{
    account::AccountSet,
    activity::ActivityQuery,
    error::PlatformError,
    transfer::{TransferOrder, TransferReceipt},
};

use crate::traits::PlatformClient;

pub struct Throttle {
    min_delay: Duration,
    max_jitter: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_delay: Duration, max_jitter: Duration) -> Self {
        Self { min_delay, max_jitter, last_request: Mutex::new(None) }
    }

    /// A throttle that never sleeps.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// How long a request issued at `now` must still wait.
    ///
    /// Draws a fresh jitter on every call.
    pub fn delay_at(&self, now: Instant) -> Duration {
        let last = *self.last_request.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(last) = last else {
            return Duration::ZERO;
        };
        let jitter_ms = rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64);
        let spacing = self.min_delay + Duration::from_millis(jitter_ms);
        spacing.saturating_sub(now.saturating_duration_since(last))
    }

    /// Note that a request just finished.
    pub fn mark(&self, at: Instant) {
        *self.last_request.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Sleep as needed, run `f`, and mark the request time once it returns.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let delay = self.delay_at(Instant::now());
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "throttling platform request");
            std::thread::sleep(delay);
        }
        let out = f();
        self.mark(Instant::now());
        out
    }
}

/// A `PlatformClient` whose every call goes through a `Throttle`.
pub struct ThrottledPlatform<P> {
    inner: P,
    throttle: Throttle,
}

impl<P: PlatformClient> ThrottledPlatform<P> {
    pub fn new(inner: P, throttle: Throttle) -> Self {
        Self { inner, throttle }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PlatformClient> PlatformClient for ThrottledPlatform<P> {
    fn fetch_accounts(&self) -> Result<AccountSet, PlatformError> {
        self.throttle.run(|| self.inner.fetch_accounts())
    }

    fn execute_transfer(&self, order: &TransferOrder) -> Result<TransferReceipt, PlatformError> {
        self.throttle.run(|| self.inner.execute_transfer(order))
    }

    fn pod_detail(&self, pod_id: &str) -> Result<Value, PlatformError> {
        self.throttle.run(|| self.inner.pod_detail(pod_id))
    }

    fn recent_activity(&self, query: &ActivityQuery) -> Result<Value, PlatformError> {
        self.throttle.run(|| self.inner.recent_activity(query))
    }

    fn transfer_status(&self, transfer_id: &str) -> Result<Value, PlatformError> {
        self.throttle.run(|| self.inner.transfer_status(transfer_id))
    }

    fn activity_summary(&self) -> Result<Value, PlatformError> {
        self.throttle.run(|| self.inner.activity_summary())
    }
}
