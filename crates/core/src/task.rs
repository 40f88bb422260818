//! Task model - a claimable unit of work.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{AgentId, ObjectId, RoomName, TaskId};
use crate::world::Position;

/// Kind of work a task describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Mine an energy source
    Harvest,
    /// Pick up or withdraw energy lying around the colony
    Collect,
    /// Carry energy into a spawn, extension, tower or storage
    Deliver,
    /// Feed the room controller
    Upgrade,
    /// Work on a construction site
    Build,
    /// Repair a damaged structure
    Repair,
    /// Engage a hostile
    Attack,
}

impl TaskKind {
    /// All kinds, in declaration order.
    pub const ALL: [TaskKind; 7] = [
        TaskKind::Harvest,
        TaskKind::Collect,
        TaskKind::Deliver,
        TaskKind::Upgrade,
        TaskKind::Build,
        TaskKind::Repair,
        TaskKind::Attack,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Harvest => "harvest",
            TaskKind::Collect => "collect",
            TaskKind::Deliver => "deliver",
            TaskKind::Upgrade => "upgrade",
            TaskKind::Build => "build",
            TaskKind::Repair => "repair",
            TaskKind::Attack => "attack",
        }
    }

    /// Concurrency limit used when the real limit is unknown, i.e. when a
    /// registry is rebuilt from identities alone.
    pub fn default_limit(&self) -> u32 {
        match self {
            TaskKind::Harvest => 1,
            TaskKind::Collect => 1,
            TaskKind::Deliver => 1,
            TaskKind::Upgrade => 8,
            TaskKind::Build => 3,
            TaskKind::Repair => 1,
            TaskKind::Attack => 2,
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Optional data carried with a task. Only the role that created the task
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPayload {
    /// Amount of energy the task was sized for
    Energy(u32),
    /// Where the worker should stand
    Spot(Position),
}

/// A task record as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Deterministic identity
    pub id: TaskId,

    /// Set when the work is done or no longer meaningful
    pub complete: bool,

    /// How many agents may share this task
    pub limit: u32,

    /// Optional role-specific data
    pub payload: Option<TaskPayload>,

    /// Agents currently holding this task
    pub holders: BTreeSet<AgentId>,
}

impl Task {
    /// Create an unassigned task for the given triple.
    pub fn new(
        room: RoomName,
        target: ObjectId,
        kind: TaskKind,
        limit: u32,
        payload: Option<TaskPayload>,
    ) -> Self {
        Self {
            id: TaskId::new(room, target, kind),
            complete: false,
            limit: limit.max(1),
            payload,
            holders: BTreeSet::new(),
        }
    }

    /// Kind of the task.
    pub fn kind(&self) -> TaskKind {
        self.id.kind
    }

    /// Target of the task.
    pub fn target(&self) -> &ObjectId {
        &self.id.target
    }

    /// Whether no further agent may join.
    pub fn is_full(&self) -> bool {
        self.holders.len() as u32 >= self.limit
    }

    /// Mark the task complete.
    pub fn finish(&mut self) {
        self.complete = true;
    }
}
