//! Colony state - one scheduling domain.

use std::collections::BTreeMap;

use colony_core::{
    Agent, AgentId, ColonyId, Creep, RoleKind, RoomName, WorldSnapshot, SPAWN_TIME_PER_PART,
};

use crate::registry::TaskRegistry;

/// Where a colony is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// First cycle after a restart or after establishment
    ColdStart,
    /// Every cycle after that
    SteadyState,
}

/// A colony: its task registry and its agent population.
///
/// Created when the colony is established, discarded when it is abandoned.
/// Nothing here is global; the orchestrator receives the colony by
/// reference every cycle.
#[derive(Debug, Clone)]
pub struct Colony {
    /// Colony id (named after the home room)
    pub id: ColonyId,
    /// Task registry
    pub registry: TaskRegistry,
    /// Live agents, keyed by name
    pub agents: BTreeMap<AgentId, Agent>,
    /// Lifecycle phase
    pub phase: CyclePhase,
    /// Cycles run so far
    pub cycles_run: u64,
}

impl Colony {
    /// Establish a new colony with no agents.
    pub fn new(id: ColonyId) -> Self {
        Self {
            id,
            registry: TaskRegistry::new(),
            agents: BTreeMap::new(),
            phase: CyclePhase::ColdStart,
            cycles_run: 0,
        }
    }

    /// Restore a colony from persisted agent memories.
    ///
    /// The registry starts empty and is rebuilt on the first cycle.
    pub fn restore(id: ColonyId, agents: impl IntoIterator<Item = Agent>) -> Self {
        let mut colony = Self::new(id);
        for agent in agents {
            colony.agents.insert(agent.name.clone(), agent);
        }
        colony
    }

    /// The home room.
    pub fn room(&self) -> RoomName {
        self.id.home_room()
    }

    /// Add an agent.
    pub fn adopt(&mut self, agent: Agent) {
        self.agents.insert(agent.name.clone(), agent);
    }

    /// Agent memories worth persisting.
    pub fn memories(&self) -> Vec<Agent> {
        self.agents.values().cloned().collect()
    }

    /// Number of agents of a role that are not nearing end of life.
    pub fn live_count(&self, role: RoleKind, world: &WorldSnapshot, margin: u32) -> u32 {
        self.agents
            .values()
            .filter(|a| a.role == role)
            .filter(|a| match world.creep(&a.name) {
                Some(creep) => !is_terminal(creep, margin),
                // Requested this cycle or last; counts as live
                None => a.pending,
            })
            .count() as u32
    }

    /// Tear the colony down, dropping its registry.
    pub fn abandon(mut self) -> Vec<Agent> {
        self.registry.clear();
        self.agents.into_values().collect()
    }
}

/// Whether a creep has less life left than it takes to replace it.
pub fn is_terminal(creep: &Creep, margin: u32) -> bool {
    match creep.ticks_to_live {
        Some(ttl) => {
            let replacement = creep.body.len() as u32 * SPAWN_TIME_PER_PART + margin;
            ttl < replacement
        }
        None => false,
    }
}
