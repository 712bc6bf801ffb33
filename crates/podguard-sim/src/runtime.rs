//! Full wiring of the safeguards around a platform.
//!
//! This is the object a chat front-end or HTTP server would construct once
//! at startup and share with every request handler.

use std::fs;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use podguard_audit::JsonlAuditLog;
use podguard_contracts::{
    actor::Actor,
    error::{GuardError, GuardResult},
};
use podguard_core::{
    clock::Clock, traits::PlatformClient, GuardConfig, MessageRateLimiter, Throttle, ThrottledPlatform,
    TransferDesk,
};
use podguard_limits::DailyLimitTracker;
use podguard_store::FactStore;
use podguard_tools::{ToolContext, ToolDispatcher};

/// What one agent turn produced.
#[derive(Debug, Clone)]
pub struct Turn {
    /// One reply per tool call, in call order.
    pub replies: Vec<Value>,
    /// Transfers staged during the turn, awaiting a human decision.
    pub staged: Vec<String>,
}

pub struct Runtime<P> {
    pub platform: Arc<P>,
    pub tracker: Arc<DailyLimitTracker>,
    pub audit: Arc<JsonlAuditLog>,
    pub facts: Arc<FactStore>,
    pub desk: Arc<TransferDesk>,
    pub tools: ToolDispatcher,
    pub rate_limiter: MessageRateLimiter,
}

impl<P: PlatformClient + 'static> Runtime<P> {
    /// Open every store under the configured data directory and wire the
    /// desk, the tool dispatcher and the rate limiter around `platform`.
    pub fn build(
        config: &GuardConfig,
        platform: Arc<P>,
        throttle: Throttle,
        clock: Arc<dyn Clock>,
    ) -> GuardResult<Self> {
        config.validate()?;
        let data_dir = &config.storage.data_dir;
        fs::create_dir_all(data_dir).map_err(|e| GuardError::StorageFailed {
            path: data_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let tracker = Arc::new(DailyLimitTracker::open_with_clock(
            config.daily_limits_path(),
            config.safeguards.max_daily_transfer_cents,
            Box::new(clock.clone()),
        )?);
        let audit = Arc::new(JsonlAuditLog::new(config.audit_path()));
        let facts = Arc::new(FactStore::open(config.memory_path(), config.memory.max_facts));

        let desk = Arc::new(
            TransferDesk::new(Arc::new(ThrottledPlatform::new(platform.clone(), throttle)), config.desk_limits())
                .with_ledger(Box::new(tracker.clone()))
                .with_audit(Box::new(audit.clone()))
                .with_clock(Box::new(clock)),
        );
        let tools = ToolDispatcher::new(desk.clone())?.with_facts(facts.clone());

        debug!(data_dir = %data_dir.display(), "runtime wired");
        Ok(Self { platform, tracker, audit, facts, desk, tools, rate_limiter: config.rate_limiter() })
    }

    /// Run the tool calls of one agent turn on behalf of `actor`.
    ///
    /// Returns `GuardError::RateLimited` without running anything when the
    /// actor is over the message rate limit.
    pub fn agent_turn(&self, actor: &Actor, calls: &[(&str, Value)]) -> GuardResult<Turn> {
        if !self.rate_limiter.admit(&actor.id) {
            warn!(actor = %actor.id, "agent turn refused by rate limiter");
            return Err(GuardError::RateLimited);
        }

        let mut ctx = ToolContext::new(Some(actor.clone()));
        let replies = calls.iter().map(|(name, input)| self.tools.dispatch(name, input, &mut ctx)).collect();
        Ok(Turn { replies, staged: ctx.staged_this_turn })
    }
}
