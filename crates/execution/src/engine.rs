//! The tick orchestrator - runs one colony's cycle.
//!
//! ```text
//! Reap → Revalidate → Assign → Execute → Sweep → (periodically) Spawn
//! ```
//!
//! The whole cycle is synchronous. Every effect leaves through the
//! [`Actuator`] as an intent and shows up in the next snapshot, so nothing
//! here needs a lock.

use std::collections::BTreeSet;

use colony_core::{Actuator, AgentId, ColonyId, RoleKind, RoomName, TaskId, WorldSnapshot};
use tracing::{debug, info, trace, warn};

use crate::colony::{is_terminal, Colony, CyclePhase};
use crate::config::OrchestratorConfig;
use crate::context::CycleContext;
use crate::planner::{PlanOutcome, WorkforcePlanner};
use crate::registry::Assignment;
use crate::roles::{common, RoleBook};

/// Why a colony could not run its cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// The snapshot has no state for the colony's home room
    #[error("home room {0} is not visible")]
    HomeRoomNotVisible(RoomName),

    /// An agent has a role the orchestrator has no behavior for
    #[error("agent {agent} has role {role} with no behavior registered")]
    RoleMissing {
        /// Agent name
        agent: AgentId,
        /// Its role
        role: RoleKind,
    },
}

/// What one colony cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Colony
    pub colony: ColonyId,
    /// Global time step
    pub time: u64,
    /// Phase the colony was in when the cycle started
    pub phase: CyclePhase,
    /// Agents dropped because their bodies are gone
    pub reaped: Vec<AgentId>,
    /// Tasks marked complete by revalidation
    pub invalidated: Vec<TaskId>,
    /// Assignments made
    pub assigned: u32,
    /// Assignments lost to another agent
    pub contended: u32,
    /// Agents that found no work
    pub idle: u32,
    /// Agents that ran their role
    pub executed: u32,
    /// Agents running the end-of-life routine
    pub disposing: u32,
    /// Tasks released after being finished this cycle
    pub swept: u32,
    /// Planner result, if the planner ran
    pub plan: Option<PlanOutcome>,
}

impl CycleReport {
    fn new(colony: ColonyId, time: u64, phase: CyclePhase) -> Self {
        Self {
            colony,
            time,
            phase,
            reaped: Vec::new(),
            invalidated: Vec::new(),
            assigned: 0,
            contended: 0,
            idle: 0,
            executed: 0,
            disposing: 0,
            swept: 0,
            plan: None,
        }
    }
}

/// Drives colony cycles.
pub struct Orchestrator {
    config: OrchestratorConfig,
    roles: RoleBook,
}

impl Orchestrator {
    /// Create an orchestrator with the standard roles.
    pub fn new(config: OrchestratorConfig) -> Self {
        let roles = RoleBook::standard(&config);
        Self { config, roles }
    }

    /// Replace the role table.
    pub fn with_roles(mut self, roles: RoleBook) -> Self {
        self.roles = roles;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Role table in use.
    pub fn roles(&self) -> &RoleBook {
        &self.roles
    }

    /// Run one cycle of `colony` against `world`.
    pub fn run_cycle(
        &self,
        colony: &mut Colony,
        world: &WorldSnapshot,
        actions: &mut dyn Actuator,
    ) -> Result<CycleReport, CycleError> {
        let home = colony.room();
        let room = world
            .room(&home)
            .ok_or_else(|| CycleError::HomeRoomNotVisible(home.clone()))?;
        for agent in colony.agents.values() {
            if self.roles.get(agent.role).is_none() {
                return Err(CycleError::RoleMissing {
                    agent: agent.name.clone(),
                    role: agent.role,
                });
            }
        }

        let ctx = CycleContext::new(world, room, &self.config);
        let mut report = CycleReport::new(colony.id.clone(), world.time, colony.phase);
        debug!("{}: cycle {} at t={}", colony.id, colony.cycles_run + 1, world.time);

        if colony.phase == CyclePhase::ColdStart {
            colony.registry.rebuild(colony.agents.values());
            info!(
                "{}: cold start with {} agents, {} tasks rebuilt",
                colony.id,
                colony.agents.len(),
                colony.registry.len()
            );
        }

        self.reap(colony, world, &mut report);

        if world.time % self.config.revalidate_interval.max(1) == 0 {
            self.revalidate(colony, &ctx, &mut report);
        }

        self.assign(colony, &ctx, &mut report);
        self.execute(colony, &ctx, actions, &mut report);
        self.sweep(colony, &mut report);

        let spawn_due = world.time % self.config.spawn_interval.max(1) == 0;
        if spawn_due || colony.phase == CyclePhase::ColdStart {
            let outcome = WorkforcePlanner::new(&self.config, &self.roles).run(colony, &ctx, actions);
            report.plan = Some(outcome);
        }

        colony.phase = CyclePhase::SteadyState;
        colony.cycles_run += 1;
        Ok(report)
    }

    /// Drop agents whose bodies are gone; let end-of-life agents go of
    /// their tasks.
    fn reap(&self, colony: &mut Colony, world: &WorldSnapshot, report: &mut CycleReport) {
        let Colony { registry, agents, .. } = colony;
        let margin = self.config.end_of_life_margin;

        let mut dead = Vec::new();
        for agent in agents.values_mut() {
            match world.creep(&agent.name) {
                Some(creep) => {
                    agent.pending = false;
                    if agent.task.is_some() && is_terminal(creep, margin) {
                        trace!("{} is near end of life", agent.name);
                        registry.release(agent);
                    }
                }
                None if agent.pending => {}
                None => dead.push(agent.name.clone()),
            }
        }

        for name in dead {
            if let Some(mut agent) = agents.remove(&name) {
                registry.release(&mut agent);
                debug!("{}: reaped {}", agent.home, name);
                report.reaped.push(name);
            }
        }
    }

    /// Mark tasks whose targets no longer qualify as complete.
    fn revalidate(&self, colony: &mut Colony, ctx: &CycleContext<'_>, report: &mut CycleReport) {
        let Colony { registry, agents, .. } = colony;
        let mut checked = BTreeSet::new();

        for agent in agents.values() {
            let Some(id) = &agent.task else {
                continue;
            };
            if !checked.insert(id.clone()) {
                continue;
            }
            let Some(task) = registry.get(id) else {
                continue;
            };
            if task.complete {
                continue;
            }
            let Some(role) = self.roles.get(agent.role) else {
                continue;
            };
            if !role.is_task_valid(agent, task, ctx) {
                debug!("{} no longer valid", id);
                registry.mark_complete(id);
                report.invalidated.push(id.clone());
            }
        }
    }

    /// Give every idle, materialized agent a task, one agent at a time.
    fn assign(&self, colony: &mut Colony, ctx: &CycleContext<'_>, report: &mut CycleReport) {
        let Colony { registry, agents, .. } = colony;
        let margin = self.config.end_of_life_margin;

        for agent in agents.values_mut() {
            let Some(creep) = ctx.world.creep(&agent.name) else {
                continue;
            };
            if creep.spawning || is_terminal(creep, margin) {
                continue;
            }

            let Some(role) = self.roles.get(agent.role) else {
                continue;
            };

            let holding = agent
                .task
                .as_ref()
                .and_then(|id| registry.get(id))
                .is_some_and(|task| !task.complete && role.keeps_task(agent, creep, task));
            if holding {
                continue;
            }
            // Drops only this agent; a shared record stays for its other holders
            registry.release(agent);
            // Assign right after discovery so the next agent sees it taken
            match role.find_task(agent, creep, registry, ctx) {
                Some(task) => match registry.assign(agent, task) {
                    Assignment::Assigned => report.assigned += 1,
                    Assignment::Contended => {
                        debug!("{} lost a task to contention", agent.name);
                        report.contended += 1;
                    }
                },
                None => report.idle += 1,
            }
        }
    }

    /// Run every materialized agent.
    fn execute(
        &self,
        colony: &mut Colony,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
        report: &mut CycleReport,
    ) {
        let Colony { registry, agents, .. } = colony;
        let margin = self.config.end_of_life_margin;

        for agent in agents.values_mut() {
            let Some(creep) = ctx.world.creep(&agent.name) else {
                continue;
            };
            if creep.spawning {
                continue;
            }
            if is_terminal(creep, margin) {
                common::dispose(agent, creep, ctx, actions);
                report.disposing += 1;
                continue;
            }
            let Some(role) = self.roles.get(agent.role) else {
                warn!("{} has no behavior for {}", agent.name, agent.role);
                continue;
            };

            let task_id = agent.task.clone();
            let task = task_id.as_ref().and_then(|id| registry.get_mut(id));
            role.execute(agent, creep, task, ctx, actions);
            report.executed += 1;
        }
    }

    /// Release tasks finished during execution.
    fn sweep(&self, colony: &mut Colony, report: &mut CycleReport) {
        let Colony { registry, agents, .. } = colony;

        for agent in agents.values_mut() {
            let finished = agent
                .task
                .as_ref()
                .and_then(|id| registry.get(id))
                .is_some_and(|task| task.complete);
            if finished {
                registry.release(agent);
                report.swept += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::testing::*;
    use crate::IntentBuffer;
    use colony_core::{Intent, TaskKind};

    fn settled(orchestrator: &Orchestrator, colony: &mut Colony, world: &WorldSnapshot) {
        let mut buf = IntentBuffer::new(world);
        orchestrator.run_cycle(colony, world, &mut buf).unwrap();
    }

    #[test]
    fn missing_home_room_is_an_error() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default());
        let mut colony = Colony::new(ColonyId::new("elsewhere"));
        let world = world(room(), vec![]);
        let mut buf = IntentBuffer::new(&world);

        let err = orchestrator.run_cycle(&mut colony, &world, &mut buf).unwrap_err();
        assert_eq!(err, CycleError::HomeRoomNotVisible(RoomName::new("elsewhere")));
        assert_eq!(colony.phase, CyclePhase::ColdStart);
    }

    #[test]
    fn unknown_role_is_an_error() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default())
            .with_roles(RoleBook::new().with(Box::new(crate::roles::Harvester::new())));
        let mut colony = Colony::new(ColonyId::new("R"));
        colony.adopt(agent("b", RoleKind::Builder));
        let world = world(room(), vec![]);
        let mut buf = IntentBuffer::new(&world);

        assert!(matches!(
            orchestrator.run_cycle(&mut colony, &world, &mut buf),
            Err(CycleError::RoleMissing { role: RoleKind::Builder, .. })
        ));
    }

    #[test]
    fn dead_agents_are_reaped_and_release_their_task() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default());
        let mut colony = Colony::new(ColonyId::new("R"));
        let miner = worker("m", pos(11, 11), 0);
        colony.adopt(agent("m", RoleKind::Harvester));

        let alive = world(room(), vec![miner]);
        settled(&orchestrator, &mut colony, &alive);
        assert!(colony.agents[&AgentId::new("m")].task.is_some());

        let mut gone = world(room(), vec![]);
        gone.time = 101;
        let mut buf = IntentBuffer::new(&gone);
        let report = orchestrator.run_cycle(&mut colony, &gone, &mut buf).unwrap();
        assert_eq!(report.reaped, vec![AgentId::new("m")]);
        assert!(!colony.agents.contains_key(&AgentId::new("m")));
        // Whatever the planner queued is still pending and holds nothing
        assert!(colony.registry.is_empty());
    }

    #[test]
    fn pending_agents_survive_until_they_appear() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default());
        let mut colony = Colony::new(ColonyId::new("R"));
        colony.adopt(colony_core::Agent::pending(
            AgentId::new("new"),
            RoleKind::Hauler,
            ColonyId::new("R"),
        ));

        let mut world = world(room(), vec![]);
        world.time = 101;
        let mut buf = IntentBuffer::new(&world);
        let report = orchestrator.run_cycle(&mut colony, &world, &mut buf).unwrap();
        assert!(report.reaped.is_empty());
        assert!(colony.agents[&AgentId::new("new")].pending);
    }

    #[test]
    fn spawning_agents_neither_take_work_nor_act() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default());
        let mut colony = Colony::new(ColonyId::new("R"));
        let mut body = worker("m", pos(25, 25), 0);
        body.spawning = true;
        colony.adopt(agent("m", RoleKind::Harvester));

        let mut world = world(room(), vec![body]);
        world.time = 101;
        let mut buf = IntentBuffer::new(&world);
        let report = orchestrator.run_cycle(&mut colony, &world, &mut buf).unwrap();
        assert_eq!(report.assigned, 0);
        assert_eq!(report.executed, 0);
        assert!(colony.agents[&AgentId::new("m")].task.is_none());
        assert!(buf.intents().iter().all(|i| i.agent().is_none()));
    }

    #[test]
    fn end_of_life_agents_dispose_instead_of_working() {
        let orchestrator = Orchestrator::new(OrchestratorConfig::default());
        let mut colony = Colony::new(ColonyId::new("R"));
        let mut old = worker("old", pos(24, 24), 0);
        old.ticks_to_live = Some(5);
        colony.adopt(agent("old", RoleKind::Upgrader));

        let mut world = world(room(), vec![old]);
        world.time = 101;
        let mut buf = IntentBuffer::new(&world);
        let report = orchestrator.run_cycle(&mut colony, &world, &mut buf).unwrap();
        assert_eq!(report.disposing, 1);
        assert!(colony.agents[&AgentId::new("old")].task.is_none());
        assert!(buf.intents().contains(&Intent::Recycle {
            agent: AgentId::new("old"),
            spawn: colony_core::ObjectId::new("spawn1"),
        }));
    }

    #[test]
    fn revalidation_only_on_its_interval() {
        let config = OrchestratorConfig {
            revalidate_interval: 10,
            spawn_interval: 1000,
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(config);
        let mut colony = Colony::new(ColonyId::new("R"));
        colony.adopt(agent("d", RoleKind::Defender));
        let fighter = creep(
            "d",
            pos(20, 20),
            vec![colony_core::BodyPart::Attack, colony_core::BodyPart::Move],
            0,
        );

        let mut raided = room();
        raided.hostiles.push(colony_core::Hostile {
            id: colony_core::ObjectId::new("raider"),
            pos: pos(40, 20),
            hits: 100,
        });
        let mut first = world(raided, vec![fighter.clone()]);
        first.time = 101;
        settled(&orchestrator, &mut colony, &first);
        let held = colony.agents[&AgentId::new("d")].task.clone().unwrap();
        assert_eq!(held.kind, TaskKind::Attack);

        // The raider left but this is not a revalidation cycle; the defender
        // finds out by trying
        let mut calm = world(room(), vec![fighter.clone()]);
        calm.time = 102;
        let mut buf = IntentBuffer::new(&calm);
        let report = orchestrator.run_cycle(&mut colony, &calm, &mut buf).unwrap();
        assert!(report.invalidated.is_empty());
        assert_eq!(report.swept, 1);

        // Revalidation cycle: held task with a vanished target is invalidated
        let mut raided = room();
        raided.hostiles.push(colony_core::Hostile {
            id: colony_core::ObjectId::new("raider"),
            pos: pos(40, 20),
            hits: 100,
        });
        let mut back = world(raided, vec![fighter.clone()]);
        back.time = 103;
        settled(&orchestrator, &mut colony, &back);
        assert!(colony.agents[&AgentId::new("d")].task.is_some());

        let mut calm = world(room(), vec![fighter]);
        calm.time = 110;
        let mut buf = IntentBuffer::new(&calm);
        let report = orchestrator.run_cycle(&mut colony, &calm, &mut buf).unwrap();
        assert_eq!(report.invalidated, vec![held]);
        assert!(colony.agents[&AgentId::new("d")].task.is_none());
    }
}
