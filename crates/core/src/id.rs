//! Identifiers for colony entities.
//!
//! Every identifier here is a plain, comparable value. Task identities in
//! particular must survive a process restart, so they are derived from the
//! work they describe rather than generated.

use serde::{Deserialize, Serialize};

use crate::task::TaskKind;

/// Name of a room (the "location" component of a task identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    /// Create a room name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a colony. A colony is named after its home room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColonyId(String);

impl ColonyId {
    /// Create a colony id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Colony id for the given home room.
    pub fn for_room(room: &RoomName) -> Self {
        Self(room.as_str().to_string())
    }

    /// The colony's home room.
    pub fn home_room(&self) -> RoomName {
        RoomName::new(self.0.clone())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ColonyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of an agent. Unique across the whole world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent id.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a world object (source, structure, site, hostile...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an object reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a task: the composite of (location, target, kind).
///
/// Two tasks built from the same triple compare equal and hash the same, no
/// matter when or by whom they were built. The string form is
/// `room:target:kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId {
    /// Room the work happens in
    pub room: RoomName,
    /// Object the work is aimed at
    pub target: ObjectId,
    /// What kind of work it is
    pub kind: TaskKind,
}

impl TaskId {
    /// Build the identity for a (location, target, kind) triple.
    pub fn new(room: RoomName, target: ObjectId, kind: TaskKind) -> Self {
        Self { room, target, kind }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.room, self.target, self.kind.as_str())
    }
}

/// Error parsing a [`TaskId`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTaskIdError {
    /// Not of the form `room:target:kind`
    #[error("malformed task id: {0}")]
    Malformed(String),

    /// Unknown task kind
    #[error("unknown task kind: {0}")]
    UnknownKind(String),
}

impl std::str::FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Room names never contain ':', object ids might.
        let (room, rest) = s
            .split_once(':')
            .ok_or_else(|| ParseTaskIdError::Malformed(s.to_string()))?;
        let (target, kind) = rest
            .rsplit_once(':')
            .ok_or_else(|| ParseTaskIdError::Malformed(s.to_string()))?;

        if room.is_empty() || target.is_empty() {
            return Err(ParseTaskIdError::Malformed(s.to_string()));
        }

        let kind = kind
            .parse()
            .map_err(|_| ParseTaskIdError::UnknownKind(kind.to_string()))?;

        Ok(Self::new(RoomName::new(room), ObjectId::new(target), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_is_deterministic() {
        let a = TaskId::new(RoomName::new("R"), ObjectId::new("X"), TaskKind::Harvest);
        let b = TaskId::new(RoomName::new("R"), ObjectId::new("X"), TaskKind::Harvest);
        assert_eq!(a, b);

        let other = TaskId::new(RoomName::new("R"), ObjectId::new("X"), TaskKind::Build);
        assert_ne!(a, other);
    }

    #[test]
    fn task_id_string_form() {
        let id = TaskId::new(RoomName::new("W1N1"), ObjectId::new("src:a"), TaskKind::Collect);
        assert_eq!(id.to_string(), "W1N1:src:a:collect");

        let parsed: TaskId = "W1N1:src:a:collect".parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn task_id_rejects_garbage() {
        assert!(matches!("nocolons".parse::<TaskId>(), Err(ParseTaskIdError::Malformed(_))));
        assert!(matches!("R:X:dance".parse::<TaskId>(), Err(ParseTaskIdError::UnknownKind(_))));
        assert!(matches!(":X:build".parse::<TaskId>(), Err(ParseTaskIdError::Malformed(_))));
    }
}
