//! Actor identity.
//!
//! An actor is whoever asks for money to move: a chat user, or nobody in
//! particular on the single-operator HTTP path. Daily spend is tracked per
//! `ActorKey`, which collapses "nobody in particular" to one global sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a user issuing transfer requests.
///
/// Chat transports hand out integer ids; they are stored as their decimal
/// string form so they can key JSON objects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<i64> for ActorId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An actor plus the display name the front-end knows them by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>) -> Self {
        Self { id: id.into(), name: None }
    }

    pub fn named(id: impl Into<ActorId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: Some(name.into()) }
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The secondary index of the daily spend ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorKey {
    /// Used whenever no per-user segregation applies.
    Global,
    User(ActorId),
}

impl ActorKey {
    /// The storage key of the global sentinel.
    pub const GLOBAL_KEY: &'static str = "__global__";

    pub fn for_actor(actor: Option<&ActorId>) -> Self {
        match actor {
            Some(id) => ActorKey::User(id.clone()),
            None => ActorKey::Global,
        }
    }

    /// Parse the key used in the persisted ledger.
    pub fn from_storage_key(key: &str) -> Self {
        if key == Self::GLOBAL_KEY {
            ActorKey::Global
        } else {
            ActorKey::User(ActorId::new(key))
        }
    }

    pub fn storage_key(&self) -> &str {
        match self {
            ActorKey::Global => Self::GLOBAL_KEY,
            ActorKey::User(id) => &id.0,
        }
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}
