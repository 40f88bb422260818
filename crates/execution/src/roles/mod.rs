//! Role capability contract.
//!
//! A role is an immutable bundle of behavior shared by every agent of one
//! kind: how many of them the colony wants, how their bodies are sized, how
//! they find and re-check work, and what they do each cycle. Roles keep no
//! per-agent state; anything remembered between cycles lives on the
//! [`Agent`] record or in the registry.

use colony_core::{Actuator, Agent, BodyBlueprint, BodyPart, Creep, RoleKind, Task};

use crate::config::OrchestratorConfig;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

pub mod common;
mod builder;
mod defender;
mod harvester;
mod hauler;
mod repairer;
mod upgrader;

pub use builder::Builder;
pub use defender::Defender;
pub use harvester::Harvester;
pub use hauler::Hauler;
pub use repairer::Repairer;
pub use upgrader::Upgrader;

/// The contract every role satisfies.
pub trait Role: Send + Sync {
    /// Which role this is.
    fn kind(&self) -> RoleKind;

    /// Body layout for this role.
    fn blueprint(&self) -> &BodyBlueprint;

    /// Target population given the colony's current state.
    fn demand(&self, colony: &ColonySnapshot) -> u32;

    /// Largest affordable body; empty when not even one repeat fits.
    fn build_body(&self, available: u32) -> Vec<BodyPart> {
        self.blueprint().build(available)
    }

    /// First eligible task not already taken, in this role's preference
    /// order. Never mutates the registry.
    fn find_task(
        &self,
        agent: &Agent,
        creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task>;

    /// Whether a held task's target still exists and still qualifies.
    fn is_task_valid(&self, agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool;

    /// Whether the agent, given its own state, still wants the task it holds.
    ///
    /// Checked every cycle before assignment. When this is false only this
    /// agent's hold is released; a shared record stays live for the others.
    fn keeps_task(&self, _agent: &Agent, _creep: &Creep, _task: &Task) -> bool {
        true
    }

    /// One unit of work. May flip the agent's mode, finish its own task, or
    /// emit intents. A task is finished only for reasons that hold for every
    /// holder, such as its target being gone.
    fn execute(
        &self,
        agent: &mut Agent,
        creep: &Creep,
        task: Option<&mut Task>,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    );
}

/// The closed table of roles a colony runs with.
pub struct RoleBook {
    roles: Vec<Box<dyn Role>>,
}

impl RoleBook {
    /// Empty book.
    pub fn new() -> Self {
        Self { roles: Vec::new() }
    }

    /// The six standard roles, with caps taken from `config`.
    pub fn standard(config: &OrchestratorConfig) -> Self {
        Self::new()
            .with(Box::new(Harvester::new()))
            .with(Box::new(Hauler::new(config.max_haulers)))
            .with(Box::new(Upgrader::new(config.max_upgraders)))
            .with(Box::new(Builder::new(config.max_builders)))
            .with(Box::new(Repairer::new(config.max_repairers)))
            .with(Box::new(Defender::new(config.max_defenders)))
    }

    /// Add or replace the role for its kind.
    pub fn with(mut self, role: Box<dyn Role>) -> Self {
        self.roles.retain(|r| r.kind() != role.kind());
        self.roles.push(role);
        self
    }

    /// Look up a role.
    pub fn get(&self, kind: RoleKind) -> Option<&dyn Role> {
        self.roles.iter().find(|r| r.kind() == kind).map(|r| r.as_ref())
    }

    /// Roles in the given priority order; kinds without a role are skipped.
    pub fn in_order<'a>(&'a self, priority: &'a [RoleKind]) -> impl Iterator<Item = &'a dyn Role> + 'a {
        priority.iter().filter_map(move |kind| self.get(*kind))
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleBook {
    fn default() -> Self {
        Self::standard(&OrchestratorConfig::default())
    }
}
