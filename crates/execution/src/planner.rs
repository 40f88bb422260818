//! Workforce planner - decides what to spawn and where.
//!
//! Per invocation, each idle spawn point walks the roles in strict priority
//! order and spawns for the first role below its demand. A role that is
//! wanted but not yet affordable halts the walk for that spawn point; a
//! cheaper, lower-priority role never jumps the queue.

use colony_core::{
    body_cost, Actuator, Agent, AgentId, ObjectId, RoleKind, SpawnOutcome,
};
use tracing::{debug, info};

use crate::colony::Colony;
use crate::config::OrchestratorConfig;
use crate::context::CycleContext;
use crate::roles::RoleBook;

/// What happened at one spawn point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A spawn was issued
    Spawned {
        /// Role spawned
        role: RoleKind,
        /// Name given to the new agent
        name: AgentId,
        /// Energy spent
        cost: u32,
    },
    /// The highest-priority unmet role cannot be afforded yet
    Waiting {
        /// Role waited on
        role: RoleKind,
        /// Cost of its body
        cost: u32,
        /// Energy on hand
        available: u32,
    },
    /// Every role is at or above demand, or no body fits
    Satisfied,
    /// The world refused the spawn request
    Rejected {
        /// Role requested
        role: RoleKind,
        /// Outcome code
        outcome: SpawnOutcome,
    },
}

/// Verdict for one spawn point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnDecision {
    /// Spawn point
    pub spawn: ObjectId,
    /// What it did
    pub verdict: Verdict,
}

/// Result of one planner pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Every spawn point is busy
    NoIdleSpawn,
    /// Too little energy on hand to bother
    BelowThreshold {
        /// Energy on hand
        available: u32,
        /// Configured minimum
        minimum: u32,
    },
    /// Spawn points were evaluated
    Evaluated(Vec<SpawnDecision>),
}

impl PlanOutcome {
    /// Roles spawned this pass, in order.
    pub fn spawned(&self) -> Vec<RoleKind> {
        match self {
            PlanOutcome::Evaluated(decisions) => decisions
                .iter()
                .filter_map(|d| match &d.verdict {
                    Verdict::Spawned { role, .. } => Some(*role),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Resource-constrained spawner for one colony.
pub struct WorkforcePlanner<'a> {
    config: &'a OrchestratorConfig,
    roles: &'a RoleBook,
}

impl<'a> WorkforcePlanner<'a> {
    /// Create a planner.
    pub fn new(config: &'a OrchestratorConfig, roles: &'a RoleBook) -> Self {
        Self { config, roles }
    }

    /// Both critical roles are extinct, so spawning may use on-hand energy.
    fn bootstrapping(&self, colony: &Colony, ctx: &CycleContext<'_>) -> bool {
        self.config
            .critical
            .iter()
            .all(|role| colony.live_count(*role, ctx.world, self.config.end_of_life_margin) == 0)
    }

    /// Run one pass.
    pub fn run(
        &self,
        colony: &mut Colony,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    ) -> PlanOutcome {
        let room = &ctx.room.name;

        let mut idle: Vec<_> = ctx.room.spawns.iter().filter(|s| s.is_idle()).collect();
        if idle.is_empty() {
            debug!("{}: no idle spawn point", colony.id);
            return PlanOutcome::NoIdleSpawn;
        }
        idle.sort_by(|a, b| {
            b.free_capacity()
                .cmp(&a.free_capacity())
                .then_with(|| a.id.cmp(&b.id))
        });

        let available = actions.energy_available(room);
        if available < self.config.min_spawn_energy && !self.bootstrapping(colony, ctx) {
            debug!("{}: {} energy is below {}", colony.id, available, self.config.min_spawn_energy);
            return PlanOutcome::BelowThreshold {
                available,
                minimum: self.config.min_spawn_energy,
            };
        }

        let mut decisions = Vec::with_capacity(idle.len());

        for (index, spawn) in idle.into_iter().enumerate() {
            let mut verdict = Verdict::Satisfied;

            for role in self.roles.in_order(&self.config.priority) {
                let kind = role.kind();
                let live = colony.live_count(kind, ctx.world, self.config.end_of_life_margin);
                if live >= role.demand(ctx.summary()) {
                    continue;
                }

                let on_hand = actions.energy_available(room);
                let budget = if self.config.is_critical(kind) && self.bootstrapping(colony, ctx) {
                    on_hand
                } else {
                    actions.energy_capacity(room)
                };

                let body = role.build_body(budget);
                if body.is_empty() {
                    continue;
                }

                let cost = body_cost(&body);
                if cost > on_hand {
                    verdict = Verdict::Waiting { role: kind, cost, available: on_hand };
                    break;
                }

                let name = AgentId::new(format!("{}-{}-{}-{}", kind, colony.id, ctx.time(), index));
                verdict = match actions.spawn(&spawn.id, &name, &body) {
                    SpawnOutcome::Ok => {
                        info!("{}: spawning {} at {} for {}", colony.id, name, spawn.id, cost);
                        colony.adopt(Agent::pending(name.clone(), kind, colony.id.clone()));
                        Verdict::Spawned { role: kind, name, cost }
                    }
                    outcome => {
                        debug!("{}: spawn of {} refused: {:?}", colony.id, kind, outcome);
                        Verdict::Rejected { role: kind, outcome }
                    }
                };
                break;
            }

            decisions.push(SpawnDecision { spawn: spawn.id.clone(), verdict });
        }

        PlanOutcome::Evaluated(decisions)
    }
}
