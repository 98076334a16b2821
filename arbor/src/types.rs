//! Common type definitions shared by the storage, repository and service layers.
//!
//! All entity identifiers are UUIDs. The [`EntityId`] alias keeps signatures readable without
//! pretending that ids of different entity kinds are distinct types: the generic layer moves ids
//! between kinds only through the entity that owns them.

use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use uuid::Uuid;

/// Identifier of any stored entity.
pub type EntityId = Uuid;

/// Write operations a service exposes, used to describe refused operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Restore,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Restore => "restore",
        };
        f.write_str(verb)
    }
}

/// Current time at the precision PostgreSQL stores (microseconds), so values written by either
/// backend compare equal after a round trip.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Abbreviated form of a batch of ids, for span fields.
pub fn abbrev_uuids(ids: &[Uuid]) -> String {
    ids.iter().map(abbrev_uuid).collect::<Vec<_>>().join(",")
}
