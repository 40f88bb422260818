//! Colony core data models.
//!
//! This crate defines the data the workforce scheduler works on: identities,
//! tasks, agents, body blueprints, the per-cycle world snapshot and the
//! intents the scheduler emits. It performs no I/O.

#![warn(missing_docs)]

// Core identities
mod id;

// Work and workers
mod task;
mod agent;
mod body;

// World view and actions
mod world;
mod intent;

// Re-exports
pub use id::*;

pub use task::{Task, TaskKind, TaskPayload};
pub use agent::{Agent, Mode, RoleKind};
pub use body::{
    body_cost, count_parts, BodyBlueprint, BodyPart, AGENT_LIFETIME, ATTACK_POWER, BUILD_POWER,
    CARRY_CAPACITY, HARVEST_POWER, HITS_PER_PART, MAX_BODY_PARTS, REPAIR_POWER,
    SPAWN_TIME_PER_PART, UPGRADE_POWER,
};
pub use world::{
    ConstructionSite, Controller, Creep, DroppedEnergy, Hostile, Position, RoomState, Source,
    Spawn, Structure, StructureKind, WorldSnapshot,
};
pub use intent::{ActionOutcome, Actuator, Intent, SpawnOutcome};

/// Global time step counter.
pub type Cycle = u64;
