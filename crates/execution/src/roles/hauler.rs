//! Hauler - moves energy from piles and containers to where it is spent.

use colony_core::{
    ActionOutcome, Actuator, Agent, BodyBlueprint, BodyPart, Creep, Mode, RoleKind,
    StructureKind, Task, TaskKind, TaskPayload,
};

use super::common::{approach, deposit, effective_mode, sync_mode};
use super::Role;
use crate::context::{ColonySnapshot, CycleContext, EnergyTarget, TargetKind};
use crate::registry::TaskRegistry;

/// Dropped energy that justifies one more hauler.
const DROPPED_PER_HAULER: u32 = 1000;

/// Most haulers sent to a single pile or container.
const MAX_PER_PICKUP: u32 = 3;

/// Carries energy. Collect tasks while gathering, deliver tasks while
/// working.
pub struct Hauler {
    blueprint: BodyBlueprint,
    cap: u32,
}

impl Hauler {
    /// Create the role with a population cap.
    pub fn new(cap: u32) -> Self {
        Self {
            blueprint: BodyBlueprint::new(vec![BodyPart::Carry, BodyPart::Carry, BodyPart::Move], 8),
            cap,
        }
    }

    fn pickups(ctx: &CycleContext<'_>) -> Vec<EnergyTarget> {
        let containers = ctx
            .stores()
            .iter()
            .filter(|t| t.kind == TargetKind::Structure(StructureKind::Container));
        ctx.piles().iter().chain(containers).cloned().collect()
    }

    fn collect_task(&self, ctx: &CycleContext<'_>, creep: &Creep, registry: &TaskRegistry) -> Option<Task> {
        let mut pickups = Self::pickups(ctx);
        pickups.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.pos.range_to(&creep.pos).cmp(&b.pos.range_to(&creep.pos)))
                .then_with(|| a.id.cmp(&b.id))
        });

        let carry = creep.carry_capacity().max(1);
        pickups.into_iter().find_map(|pickup| {
            let limit = pickup.amount.div_ceil(carry).clamp(1, MAX_PER_PICKUP);
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                pickup.id,
                TaskKind::Collect,
                limit,
                Some(TaskPayload::Energy(pickup.amount)),
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }

    /// Mode an agent must be in to work a task of this kind.
    fn mode_for(task: &Task) -> Mode {
        match task.kind() {
            TaskKind::Collect => Mode::Gathering,
            _ => Mode::Working,
        }
    }

    fn deliver_task(&self, ctx: &CycleContext<'_>, creep: &Creep, registry: &TaskRegistry) -> Option<Task> {
        let mut sinks: Vec<EnergyTarget> = ctx.sinks().to_vec();
        sinks.sort_by(|a, b| {
            a.pos
                .range_to(&creep.pos)
                .cmp(&b.pos.range_to(&creep.pos))
                .then_with(|| a.id.cmp(&b.id))
        });
        sinks.extend(ctx.storage());

        sinks.into_iter().find_map(|sink| {
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                sink.id,
                TaskKind::Deliver,
                TaskKind::Deliver.default_limit(),
                Some(TaskPayload::Energy(sink.free)),
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }
}

impl Role for Hauler {
    fn kind(&self) -> RoleKind {
        RoleKind::Hauler
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        if colony.sources.is_empty() {
            return 0;
        }
        let wanted = colony.sources.len() as u32 + colony.dropped_energy / DROPPED_PER_HAULER;
        wanted.min(self.cap)
    }

    fn find_task(
        &self,
        agent: &Agent,
        creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        match effective_mode(agent, creep) {
            Mode::Gathering => self.collect_task(ctx, creep, registry),
            Mode::Working => self.deliver_task(ctx, creep, registry),
        }
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        let room = ctx.room;
        match task.kind() {
            TaskKind::Collect => {
                room.dropped(task.target()).is_some_and(|d| d.amount > 0)
                    || room.structure(task.target()).is_some_and(|s| s.store > 0)
            }
            TaskKind::Deliver => {
                room.spawn(task.target()).is_some_and(|s| s.free_capacity() > 0)
                    || room.structure(task.target()).is_some_and(|s| s.free_capacity() > 0)
            }
            _ => false,
        }
    }

    fn keeps_task(&self, agent: &Agent, creep: &Creep, task: &Task) -> bool {
        effective_mode(agent, creep) == Self::mode_for(task)
    }

    fn execute(
        &self,
        agent: &mut Agent,
        creep: &Creep,
        task: Option<&mut Task>,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    ) {
        let mode = sync_mode(agent, creep);
        let Some(task) = task else {
            if mode == Mode::Working {
                deposit(agent, creep, ctx, actions);
            }
            return;
        };

        // Filled up or ran dry; the hold is dropped before the next assignment
        if mode != Self::mode_for(task) {
            return;
        }

        let Some(pos) = ctx.room.position_of(task.target()).cloned() else {
            task.finish();
            return;
        };
        let outcome = match task.kind() {
            TaskKind::Collect if ctx.room.dropped(task.target()).is_some() => {
                actions.pickup(&agent.name, task.target())
            }
            TaskKind::Collect => actions.withdraw(&agent.name, task.target()),
            _ => actions.transfer(&agent.name, task.target()),
        };

        let outcome = approach(actions, agent, outcome, &pos, 1);
        let finished = match task.kind() {
            // Shared: only an emptied or vanished pickup ends it for everyone
            TaskKind::Collect => matches!(
                outcome,
                ActionOutcome::InvalidTarget | ActionOutcome::NotEnoughResources
            ),
            _ => matches!(
                outcome,
                ActionOutcome::Ok | ActionOutcome::InvalidTarget | ActionOutcome::Full
            ),
        };
        if finished {
            task.finish();
        }
    }
}
