//! Upgrader - feeds the room controller.

use colony_core::{
    ActionOutcome, Actuator, Agent, BodyBlueprint, BodyPart, Creep, Mode, RoleKind, Task,
    TaskKind,
};

use super::common::{approach, deposit, refill, sync_mode};
use super::Role;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

/// Stored energy that justifies one more upgrader.
const STORED_PER_UPGRADER: u32 = 10_000;

/// Upgrades the owned controller. All upgraders share one task.
pub struct Upgrader {
    blueprint: BodyBlueprint,
    cap: u32,
}

impl Upgrader {
    /// Create the role with a population cap.
    pub fn new(cap: u32) -> Self {
        Self {
            blueprint: BodyBlueprint::new(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 6),
            cap,
        }
    }
}

impl Role for Upgrader {
    fn kind(&self) -> RoleKind {
        RoleKind::Upgrader
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        match colony.controller_level {
            Some(_) => (1 + colony.stored_energy / STORED_PER_UPGRADER).min(self.cap),
            None => 0,
        }
    }

    fn find_task(
        &self,
        _agent: &Agent,
        _creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        let controller = ctx.room.controller.as_ref().filter(|c| c.owned)?;
        let task = TaskRegistry::create(
            ctx.room.name.clone(),
            controller.id.clone(),
            TaskKind::Upgrade,
            self.cap,
            None,
        );
        (!registry.is_taken(&task.id)).then_some(task)
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        ctx.room
            .controller_by_id(task.target())
            .is_some_and(|c| c.owned)
    }

    fn execute(
        &self,
        agent: &mut Agent,
        creep: &Creep,
        task: Option<&mut Task>,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    ) {
        match (sync_mode(agent, creep), task) {
            (Mode::Gathering, _) => {
                refill(agent, creep, ctx, actions);
            }
            (Mode::Working, Some(task)) => {
                let Some(controller) = ctx.room.controller_by_id(task.target()) else {
                    task.finish();
                    return;
                };
                let outcome = actions.upgrade(&agent.name, &controller.id);
                match approach(actions, agent, outcome, &controller.pos, 3) {
                    ActionOutcome::NotOwner | ActionOutcome::InvalidTarget => task.finish(),
                    _ => {}
                }
            }
            (Mode::Working, None) => {
                deposit(agent, creep, ctx, actions);
            }
        }
    }
}
