//! Account name resolution.
//!
//! Users and agents refer to accounts by human names ("rent", "Groceries").
//! Resolution is deliberately conservative: an exact case-insensitive match
//! wins, otherwise a substring match is accepted only when it is unique. The
//! resolver never guesses between several candidates.

use podguard_contracts::{
    account::Account,
    error::{GuardError, GuardResult},
};

/// Outcome of resolving one name against a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a Account),
    /// Two or more substring matches, in candidate order.
    Ambiguous(Vec<&'a Account>),
    NotFound,
}

/// Which listing tool a "not found" message should point the caller at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListHint {
    Pods,
    Accounts,
}

impl ListHint {
    fn suggestion(self) -> &'static str {
        match self {
            ListHint::Pods => " Try using get_all_pods to see available pods.",
            ListHint::Accounts => " Try using get_all_accounts to see available accounts.",
        }
    }
}

/// Resolve `query` against `candidates`.
///
/// Exact matches are compared case-insensitively and the first one wins.
pub fn resolve<'a, I>(query: &str, candidates: I) -> Resolution<'a>
where
    I: IntoIterator<Item = &'a Account>,
{
    let candidates: Vec<&'a Account> = candidates.into_iter().collect();
    let needle = query.to_lowercase();

    if let Some(exact) = candidates.iter().copied().find(|a| a.name.to_lowercase() == needle) {
        return Resolution::Found(exact);
    }

    let mut partial: Vec<&'a Account> = candidates
        .into_iter()
        .filter(|a| a.name.to_lowercase().contains(&needle))
        .collect();

    match partial.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(partial.remove(0)),
        _ => Resolution::Ambiguous(partial),
    }
}

impl<'a> Resolution<'a> {
    /// Turn the outcome into the account or a user-facing error.
    ///
    /// `role` names the thing being looked up ("Source", "Pod") and leads the
    /// error message.
    pub fn into_result(self, role: &str, query: &str, hint: ListHint) -> GuardResult<&'a Account> {
        match self {
            Resolution::Found(account) => Ok(account),
            Resolution::Ambiguous(matches) => Err(GuardError::AmbiguousAccount {
                role: role.to_string(),
                query: query.to_string(),
                candidates: matches.iter().map(|a| a.name.clone()).collect(),
            }),
            Resolution::NotFound => Err(GuardError::AccountNotFound {
                role: role.to_string(),
                query: query.to_string(),
                suggestion: hint.suggestion().to_string(),
            }),
        }
    }
}
