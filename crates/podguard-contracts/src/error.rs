//! Error types for the transfer safeguards.
//!
//! Every operation an end user or agent can trigger returns
//! `GuardResult<T>`. Error messages are written to be shown to that user as
//! is, with the exceptions listed on `GuardError::user_message`.

use thiserror::Error;

use crate::account::Cents;

/// A failure reported by the remote platform.
///
/// `Rejected` is a business refusal (insufficient funds on the platform's
/// side, a closed account, ...) whose message is safe to show verbatim.
/// `Upstream` is everything else: network failures, non-2xx responses,
/// malformed replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("{0}")]
    Rejected(String),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl PlatformError {
    /// Message prefix the platform client uses for business refusals.
    pub const BUSINESS_FAILURE_MARKER: &'static str = "Transfer failed:";

    /// Classify a raw failure message for adapters that only have text.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(Self::BUSINESS_FAILURE_MARKER) {
            PlatformError::Rejected(message)
        } else {
            PlatformError::Upstream(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PlatformError::Rejected(m) | PlatformError::Upstream(m) => m,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, PlatformError::Rejected(_))
    }
}

/// The unified error type for the safeguard crates.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Note is too long ({len} chars). Maximum is {max} characters.")]
    NoteTooLong { len: usize, max: usize },

    #[error("Amount must be a positive number.")]
    InvalidAmount,

    #[error("Amount {amount} exceeds the maximum transfer limit of {max}.")]
    OverTransferLimit { amount: Cents, max: Cents },

    /// The daily ceiling would be exceeded. Carries the concrete allowance so
    /// the caller can propose a smaller amount.
    #[error(
        "This transfer would exceed your daily limit of {limit}. \
         You've transferred {used} today. Remaining: {remaining}."
    )]
    DailyLimitExceeded { limit: Cents, used: Cents, remaining: Cents },

    /// `suggestion` starts with a space and is appended to the message.
    #[error("{role} '{query}' not found.{suggestion}")]
    AccountNotFound { role: String, query: String, suggestion: String },

    #[error("{role} '{query}' matches more than one account. Did you mean: {}?", .candidates.join(", "))]
    AmbiguousAccount { role: String, query: String, candidates: Vec<String> },

    #[error("Insufficient balance in '{account}'. Available: {available}, requested: {requested}.")]
    InsufficientFunds { account: String, available: String, requested: Cents },

    #[error("No pending transfer found with that ID.")]
    TransferNotFound,

    /// Distinct from `TransferNotFound` so callers can tell "too late" from
    /// "never existed".
    #[error("This transfer has expired. Please request a new transfer.")]
    TransferExpired,

    #[error("You can only manage your own transfers.")]
    NotOwner,

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The audit trail could not be written. Never swallowed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    #[error("failed to persist '{path}': {reason}")]
    StorageFailed { path: String, reason: String },

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Invalid input for {tool}: {reason}")]
    InvalidToolInput { tool: String, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Fact '{0}' not found.")]
    FactNotFound(String),

    #[error("Memory is full ({max} facts). Delete a fact before adding a new one.")]
    MemoryFull { max: usize },

    #[error("Memory is not available.")]
    MemoryUnavailable,

    /// The actor sent too many messages inside the rate-limit window.
    #[error("Whoa, slow down! You're sending messages too fast. Give me a moment and try again.")]
    RateLimited,
}

impl GuardError {
    /// Generic text shown in place of opaque failures.
    pub const GENERIC_FAILURE: &'static str = "Something went wrong. Please try again.";

    /// The text to put in front of an end user.
    ///
    /// Upstream platform failures and persistence failures are replaced by a
    /// generic message; everything else is shown as is.
    pub fn user_message(&self) -> String {
        match self {
            GuardError::Platform(PlatformError::Upstream(_))
            | GuardError::AuditWriteFailed { .. }
            | GuardError::StorageFailed { .. }
            | GuardError::ConfigError { .. } => Self::GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }

    /// The status an HTTP boundary reports for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            GuardError::NoteTooLong { .. }
            | GuardError::InvalidAmount
            | GuardError::OverTransferLimit { .. }
            | GuardError::DailyLimitExceeded { .. }
            | GuardError::AccountNotFound { .. }
            | GuardError::AmbiguousAccount { .. }
            | GuardError::InsufficientFunds { .. }
            | GuardError::InvalidToolInput { .. }
            | GuardError::UnknownTool(_)
            | GuardError::MemoryFull { .. }
            | GuardError::Platform(PlatformError::Rejected(_)) => 400,
            GuardError::NotOwner => 403,
            GuardError::TransferNotFound | GuardError::FactNotFound(_) => 404,
            GuardError::TransferExpired => 410,
            GuardError::Platform(PlatformError::Upstream(_)) => 502,
            GuardError::RateLimited => 429,
            GuardError::MemoryUnavailable => 503,
            GuardError::AuditWriteFailed { .. }
            | GuardError::StorageFailed { .. }
            | GuardError::ConfigError { .. } => 500,
        }
    }
}

/// Convenience alias used throughout the podguard crates.
pub type GuardResult<T> = Result<T, GuardError>;
