//! Action intents and the outcome codes the world answers with.

use serde::{Deserialize, Serialize};

use crate::body::BodyPart;
use crate::id::{AgentId, ObjectId, RoomName};
use crate::world::Position;

/// An action the scheduler asks the world to carry out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Step toward a position
    Move { agent: AgentId, to: Position },
    /// Mine a source
    Harvest { agent: AgentId, source: ObjectId },
    /// Pick up a dropped pile
    Pickup { agent: AgentId, target: ObjectId },
    /// Take energy out of a container or storage
    Withdraw { agent: AgentId, target: ObjectId },
    /// Put energy into a spawn or structure
    Transfer { agent: AgentId, target: ObjectId },
    /// Drop everything carried
    Drop { agent: AgentId },
    /// Work a construction site
    Build { agent: AgentId, site: ObjectId },
    /// Repair a structure
    Repair { agent: AgentId, target: ObjectId },
    /// Upgrade the controller
    Upgrade { agent: AgentId, controller: ObjectId },
    /// Hit a hostile
    Attack { agent: AgentId, target: ObjectId },
    /// Be taken apart by a spawn point
    Recycle { agent: AgentId, spawn: ObjectId },
    /// Start producing a body
    Spawn { spawn: ObjectId, name: AgentId, body: Vec<BodyPart> },
}

impl Intent {
    /// The agent issuing the intent, if it is an agent action.
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Intent::Move { agent, .. }
            | Intent::Harvest { agent, .. }
            | Intent::Pickup { agent, .. }
            | Intent::Withdraw { agent, .. }
            | Intent::Transfer { agent, .. }
            | Intent::Drop { agent }
            | Intent::Build { agent, .. }
            | Intent::Repair { agent, .. }
            | Intent::Upgrade { agent, .. }
            | Intent::Attack { agent, .. }
            | Intent::Recycle { agent, .. } => Some(agent),
            Intent::Spawn { .. } => None,
        }
    }
}

/// Answer to an agent action request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Accepted
    Ok,
    /// Target too far away; move first
    NotInRange,
    /// Target does not exist or is the wrong kind
    InvalidTarget,
    /// Agent or target is not ours
    NotOwner,
    /// Nothing to take or nothing to give
    NotEnoughResources,
    /// Target or agent cannot hold more
    Full,
    /// Agent lacks the body part for this action
    NoBodyPart,
    /// Agent already acted, or is still being spawned
    Busy,
}

impl ActionOutcome {
    /// Whether the request was accepted.
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionOutcome::Ok)
    }
}

/// Answer to a spawn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnOutcome {
    /// Spawning started
    Ok,
    /// Not enough energy on hand
    NotEnoughEnergy,
    /// Spawn point missing or already busy
    Unavailable,
    /// Body too large or agent cap reached
    AtCapacityLimit,
    /// Empty body or a name already in use
    InvalidRequest,
}

/// Seam through which roles and the planner act on the world.
///
/// Implementations check preconditions against the current snapshot and
/// record intents; they never change the snapshot.
pub trait Actuator {
    /// Step toward `to` until within `range`.
    fn move_to(&mut self, agent: &AgentId, to: &Position, range: u32) -> ActionOutcome;

    /// Mine a source.
    fn harvest(&mut self, agent: &AgentId, source: &ObjectId) -> ActionOutcome;

    /// Pick up a dropped pile.
    fn pickup(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome;

    /// Take energy out of a container or storage.
    fn withdraw(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome;

    /// Put carried energy into a spawn or structure.
    fn transfer(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome;

    /// Drop carried energy where the agent stands.
    fn drop_energy(&mut self, agent: &AgentId) -> ActionOutcome;

    /// Work a construction site.
    fn build(&mut self, agent: &AgentId, site: &ObjectId) -> ActionOutcome;

    /// Repair a structure.
    fn repair(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome;

    /// Upgrade a controller.
    fn upgrade(&mut self, agent: &AgentId, controller: &ObjectId) -> ActionOutcome;

    /// Hit a hostile.
    fn attack(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome;

    /// Be recycled by a spawn point.
    fn recycle(&mut self, agent: &AgentId, spawn: &ObjectId) -> ActionOutcome;

    /// Energy on hand for spawning in a room, net of spawns already issued
    /// this cycle.
    fn energy_available(&self, room: &RoomName) -> u32;

    /// Full spawning energy capacity of a room.
    fn energy_capacity(&self, room: &RoomName) -> u32;

    /// Start producing a body at a spawn point.
    fn spawn(&mut self, spawn: &ObjectId, name: &AgentId, body: &[BodyPart]) -> SpawnOutcome;
}
