//! Activity feed filters.
//!
//! Each filter enum mirrors a fixed enumeration of the platform and
//! serializes to its upper-snake-case wire value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferDirection {
    Internal,
    Outgoing,
    Incoming,
}

impl TransferDirection {
    pub const ALL: [Self; 3] = [Self::Internal, Self::Outgoing, Self::Incoming];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::Outgoing => "OUTGOING",
            Self::Incoming => "INCOMING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Complete,
    Pending,
}

impl TransferStatus {
    pub const ALL: [Self; 2] = [Self::Complete, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Pending => "PENDING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    OneTimeTransfer,
    Rule,
    /// Funds the platform itself pulled from a pod.
    PulledFromSequence,
    MoneyIn,
    Cashback,
}

impl ActivityType {
    pub const ALL: [Self; 5] = [
        Self::OneTimeTransfer,
        Self::Rule,
        Self::PulledFromSequence,
        Self::MoneyIn,
        Self::Cashback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTimeTransfer => "ONE_TIME_TRANSFER",
            Self::Rule => "RULE",
            Self::PulledFromSequence => "PULLED_FROM_SEQUENCE",
            Self::MoneyIn => "MONEY_IN",
            Self::Cashback => "CASHBACK",
        }
    }
}

fn default_count() -> u32 {
    ActivityQuery::DEFAULT_COUNT
}

/// A page request against the platform's transfer activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityQuery {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<TransferDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransferStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
}

impl ActivityQuery {
    pub const DEFAULT_COUNT: u32 = 10;
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            direction: None,
            status: None,
            activity_type: None,
        }
    }
}
