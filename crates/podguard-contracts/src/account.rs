//! Account and money types.
//!
//! Accounts are sourced fresh from the remote platform on every lookup. The
//! runtime never caches balances beyond a single staging call, so these types
//! are plain snapshots with no identity beyond their `id`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of account a balance lives in.
///
/// Serialized in upper case to match the platform's own enumeration:
/// `"POD"`, `"PORT"`, `"ACCOUNT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountKind {
    /// A named sub-account holding a balance.
    Pod,
    /// A named income-source account.
    Port,
    /// An external bank account or card. Listed, never a transfer endpoint.
    Account,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Pod => "POD",
            AccountKind::Port => "PORT",
            AccountKind::Account => "ACCOUNT",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved account snapshot.
///
/// `balance_display` is the platform's own formatted string; it is carried
/// through untouched so user-facing messages show exactly what the platform
/// reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub balance_cents: i64,
    #[serde(rename = "balance")]
    pub balance_display: String,
}

impl Account {
    /// Build an account whose display balance is derived from `balance_cents`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        balance_cents: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            balance_cents,
            balance_display: Cents(balance_cents).to_string(),
        }
    }
}

/// Every account visible to the organization, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
    pub pods: Vec<Account>,
    pub ports: Vec<Account>,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl AccountSet {
    /// Accounts that may act as a transfer source or destination: pods first,
    /// then ports.
    pub fn transfer_endpoints(&self) -> impl Iterator<Item = &Account> {
        self.pods.iter().chain(self.ports.iter())
    }

    /// Sum of every pod balance.
    pub fn total_balance(&self) -> TotalBalance {
        let total: i64 = self.pods.iter().map(|p| p.balance_cents).sum();
        TotalBalance {
            total_balance_cents: total,
            total_balance: Cents(total).to_string(),
            pod_count: self.pods.len(),
        }
    }
}

/// Aggregate pod balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalBalance {
    pub total_balance_cents: i64,
    pub total_balance: String,
    pub pod_count: usize,
}

/// An amount of money in integer cents, displayed as dollars.
///
/// `Cents(123456)` displays as `$1,234.56`; negative amounts display as
/// `-$12.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}

/// Render integer cents as `$1,234.56`.
pub fn format_cents(cents: i64) -> String {
    Cents(cents).to_string()
}

/// Convert a dollar amount into integer cents.
///
/// Returns `None` for anything that is not a finite positive amount, or that
/// rounds to zero cents. Rounding is half-to-even, and this is the only place
/// a dollar amount is ever rounded.
pub fn dollars_to_cents(amount_dollars: f64) -> Option<i64> {
    if !amount_dollars.is_finite() || amount_dollars <= 0.0 {
        return None;
    }
    let cents = (amount_dollars * 100.0).round_ties_even();
    if cents < 1.0 || cents >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}
