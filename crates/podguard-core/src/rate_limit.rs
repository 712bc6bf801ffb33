//! Per-actor inbound message rate limiting.
//!
//! A sliding window: an actor may send at most `max_messages` within any
//! `window`. Refused messages are not counted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

use podguard_contracts::actor::ActorId;

pub struct MessageRateLimiter {
    max_messages: usize,
    window: Duration,
    history: Mutex<HashMap<ActorId, VecDeque<Instant>>>,
}

impl MessageRateLimiter {
    pub fn new(max_messages: usize, window: Duration) -> Self {
        Self { max_messages, window, history: Mutex::new(HashMap::new()) }
    }

    /// Admit a message arriving now.
    pub fn admit(&self, actor: &ActorId) -> bool {
        self.admit_at(actor, Instant::now())
    }

    /// Returns `true` and counts the message if the actor is under the limit.
    pub fn admit_at(&self, actor: &ActorId, now: Instant) -> bool {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = history.entry(actor.clone()).or_default();

        while let Some(&oldest) = seen.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                seen.pop_front();
            } else {
                break;
            }
        }

        if seen.len() >= self.max_messages {
            warn!(actor = %actor, limit = self.max_messages, "message rate limit hit");
            return false;
        }
        seen.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleventh_message_in_window_is_refused() {
        let limiter = MessageRateLimiter::new(10, Duration::from_secs(60));
        let alice = ActorId::new("alice");
        let start = Instant::now();

        for i in 0..10 {
            assert!(limiter.admit_at(&alice, start + Duration::from_secs(i)), "message {i}");
        }
        assert!(!limiter.admit_at(&alice, start + Duration::from_secs(30)));
    }

    #[test]
    fn window_slides() {
        let limiter = MessageRateLimiter::new(2, Duration::from_secs(60));
        let alice = ActorId::new("alice");
        let start = Instant::now();

        assert!(limiter.admit_at(&alice, start));
        assert!(limiter.admit_at(&alice, start + Duration::from_secs(30)));
        assert!(!limiter.admit_at(&alice, start + Duration::from_secs(59)));
        // The first message has aged out.
        assert!(limiter.admit_at(&alice, start + Duration::from_secs(60)));
        assert!(!limiter.admit_at(&alice, start + Duration::from_secs(61)));
    }

    #[test]
    fn actors_are_limited_independently() {
        let limiter = MessageRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.admit_at(&ActorId::new("alice"), start));
        assert!(!limiter.admit_at(&ActorId::new("alice"), start));
        assert!(limiter.admit_at(&ActorId::new("bob"), start));
    }
}
