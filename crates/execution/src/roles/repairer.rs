//! Repairer - keeps structures standing.

use colony_core::{
    ActionOutcome, Actuator, Agent, BodyBlueprint, BodyPart, Creep, Mode, RoleKind, Task,
    TaskKind,
};

use super::common::{approach, deposit, refill, sync_mode};
use super::Role;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

/// Above this many damaged structures a second repairer is wanted.
const BACKLOG: u32 = 10;

/// Repairs damaged structures, worst first, one repairer per structure.
pub struct Repairer {
    blueprint: BodyBlueprint,
    cap: u32,
}

impl Repairer {
    /// Create the role with a population cap.
    pub fn new(cap: u32) -> Self {
        Self {
            blueprint: BodyBlueprint::new(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 4),
            cap,
        }
    }
}

impl Role for Repairer {
    fn kind(&self) -> RoleKind {
        RoleKind::Repairer
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        let wanted = match colony.damaged_structures {
            0 => 0,
            n if n > BACKLOG => 2,
            _ => 1,
        };
        wanted.min(self.cap)
    }

    fn find_task(
        &self,
        _agent: &Agent,
        _creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        ctx.damaged().iter().find_map(|structure| {
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                structure.id.clone(),
                TaskKind::Repair,
                TaskKind::Repair.default_limit(),
                None,
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        ctx.room
            .structure(task.target())
            .is_some_and(|s| s.hits < s.hits_max)
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
                let Some(structure) = ctx.room.structure(task.target()) else {
                    task.finish();
                    return;
                };
                if structure.hits >= structure.hits_max {
                    task.finish();
                    return;
                }
                let outcome = actions.repair(&agent.name, &structure.id);
                if approach(actions, agent, outcome, &structure.pos, 3) == ActionOutcome::InvalidTarget {
                    task.finish();
                }
            }
            (Mode::Working, None) => {
                deposit(agent, creep, ctx, actions);
            }
        }
    }
}
