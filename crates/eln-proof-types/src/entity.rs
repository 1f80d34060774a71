//! Entity handles and lock state

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database id of an experiment or item
pub type EntityId = u64;
/// Database id of a user
pub type UserId = u64;
/// Database id of a team
pub type TeamId = u64;

/// Kind of entity that can be timestamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An experiment
    Experiment,
    /// A database item
    Item,
}

impl EntityKind {
    /// Table-style name used in storage keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Experiment => "experiments",
            EntityKind::Item => "items",
        }
    }
}

/// Explicit handle on the entity being timestamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity id
    pub id: EntityId,
    /// Entity kind
    pub kind: EntityKind,
}

impl EntityRef {
    /// Handle on an experiment
    pub fn experiment(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::Experiment,
        }
    }

    /// Handle on a database item
    pub fn item(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::Item,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Descriptive fields of an entity sent along with notary requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Stable unique identifier of the entity
    pub elabid: String,
    /// Entity title
    pub title: String,
}

/// The user initiating an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id
    pub user_id: UserId,
    /// Team the user acts in
    pub team_id: TeamId,
    /// Display name, used as notary author
    pub fullname: String,
}

/// Lock and timestamp state of an entity
///
/// `timestamped` is terminal: once set, nothing in this crate clears it and
/// [`LockState::unlock`] refuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub locked: bool,
    pub locked_by: Option<UserId>,
    pub locked_when: Option<String>,
    pub timestamped: bool,
    pub timestamped_by: Option<UserId>,
    pub timestamped_when: Option<String>,
    /// Storage key of the timestamp token evidence
    pub timestamp_token: Option<String>,
}

impl LockState {
    /// State of an entity after a successful timestamp commit
    pub fn committed(commit: &LockCommit) -> Self {
        Self {
            locked: true,
            locked_by: Some(commit.user_id),
            locked_when: Some(commit.locked_when.clone()),
            timestamped: true,
            timestamped_by: Some(commit.user_id),
            timestamped_when: Some(commit.timestamped_when.clone()),
            timestamp_token: Some(commit.timestamp_token.clone()),
        }
    }

    /// Release an ordinary lock
    pub fn unlock(&mut self, entity: &EntityRef) -> Result<()> {
        if self.timestamped {
            return Err(Error::Immutable(entity.to_string()));
        }
        self.locked = false;
        self.locked_by = None;
        self.locked_when = None;
        Ok(())
    }
}

/// The single mutation applied to an entity when a timestamp succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockCommit {
    /// User who initiated the timestamp
    pub user_id: UserId,
    /// Wall-clock time of the commit, `YYYY-MM-DD HH:MM:SS`
    pub locked_when: String,
    /// Time asserted by the TSA, `YYYY-MM-DD HH:MM:SS`
    pub timestamped_when: String,
    /// Storage key of the timestamp token evidence
    pub timestamp_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit() -> LockCommit {
        LockCommit {
            user_id: 7,
            locked_when: "2024-03-01 10:00:02".to_string(),
            timestamped_when: "2024-03-01 10:00:00".to_string(),
            timestamp_token: "experiments/42/token.asn1".to_string(),
        }
    }

    #[test]
    fn test_committed_state_is_locked_and_timestamped() {
        let state = LockState::committed(&commit());
        assert!(state.locked);
        assert!(state.timestamped);
        assert_eq!(state.timestamped_by, Some(7));
        assert_eq!(state.timestamped_when.as_deref(), Some("2024-03-01 10:00:00"));
    }

    #[test]
    fn test_timestamped_entity_cannot_be_unlocked() {
        let entity = EntityRef::experiment(42);
        let mut state = LockState::committed(&commit());
        let err = state.unlock(&entity).unwrap_err();
        assert_eq!(err, Error::Immutable("experiments:42".to_string()));
        assert!(state.locked);
        assert!(state.timestamped);
    }

    #[test]
    fn test_plain_lock_can_be_released() {
        let entity = EntityRef::item(3);
        let mut state = LockState {
            locked: true,
            locked_by: Some(1),
            ..Default::default()
        };
        state.unlock(&entity).unwrap();
        assert!(!state.locked);
        assert_eq!(state.locked_by, None);
    }
}
