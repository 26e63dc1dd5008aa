//! Store identifiers.
//!
//! Every identifier that reaches the persistence layer goes through
//! [`EntityId::parse`] first, so malformed ids are rejected before any lookup.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id: {0:?}")]
pub struct InvalidEntityId(pub String);

/// Identifier of a stored entity (user, project, task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        EntityId(Uuid::new_v4())
    }

    /// Parse a raw path/query/body value. Surrounding whitespace is not accepted.
    pub fn parse(raw: &str) -> Result<Self, InvalidEntityId> {
        if raw.is_empty() || raw.trim() != raw {
            return Err(InvalidEntityId(raw.to_string()));
        }
        Uuid::parse_str(raw)
            .map(EntityId)
            .map_err(|_| InvalidEntityId(raw.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        EntityId(id)
    }
}

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
