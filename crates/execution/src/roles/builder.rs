//! Builder - turns construction sites into structures.

use colony_core::{
    ActionOutcome, Actuator, Agent, BodyBlueprint, BodyPart, Creep, Mode, RoleKind, Task,
    TaskKind,
};

use super::common::{approach, deposit, refill, sync_mode};
use super::Role;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

/// Outstanding build progress that justifies one more builder.
const PROGRESS_PER_BUILDER: u32 = 3000;

/// Works construction sites, most important kind first.
pub struct Builder {
    blueprint: BodyBlueprint,
    cap: u32,
}

impl Builder {
    /// Create the role with a population cap.
    pub fn new(cap: u32) -> Self {
        Self {
            blueprint: BodyBlueprint::new(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 5),
            cap,
        }
    }
}

impl Role for Builder {
    fn kind(&self) -> RoleKind {
        RoleKind::Builder
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        if colony.construction_sites == 0 {
            return 0;
        }
        (1 + colony.build_remaining / PROGRESS_PER_BUILDER).min(self.cap)
    }

    fn find_task(
        &self,
        _agent: &Agent,
        creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        let mut sites: Vec<_> = ctx.room.sites.iter().collect();
        sites.sort_by_key(|s| {
            (s.kind.build_rank(), s.remaining(), s.pos.range_to(&creep.pos), s.id.clone())
        });

        sites.into_iter().find_map(|site| {
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                site.id.clone(),
                TaskKind::Build,
                TaskKind::Build.default_limit(),
                None,
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        ctx.room.site(task.target()).is_some()
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
                let Some(site) = ctx.room.site(task.target()) else {
                    task.finish();
                    return;
                };
                let outcome = actions.build(&agent.name, &site.id);
                if approach(actions, agent, outcome, &site.pos, 3) == ActionOutcome::InvalidTarget {
                    task.finish();
                }
            }
            (Mode::Working, None) => {
                deposit(agent, creep, ctx, actions);
            }
        }
    }
}
