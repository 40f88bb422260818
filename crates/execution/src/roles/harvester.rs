//! Harvester - mines sources and gets the energy moving.

use colony_core::{
    Actuator, Agent, BodyBlueprint, BodyPart, Creep, Mode, RoleKind, StructureKind, Task,
    TaskKind, TaskPayload, HARVEST_POWER,
};

use super::common::{approach, deposit, sync_mode};
use super::Role;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

/// WORK parts that drain a regular source exactly as fast as it regenerates.
const WORK_PER_SOURCE: u32 = 10 / HARVEST_POWER;

/// Mines sources. One task per source, shared by as many harvesters as the
/// source needs and has room for.
pub struct Harvester {
    blueprint: BodyBlueprint,
}

impl Harvester {
    /// Create the role.
    pub fn new() -> Self {
        Self {
            blueprint: BodyBlueprint::new(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 5),
        }
    }

    /// WORK parts in the best body `capacity` energy buys (at least one).
    fn work_per_body(&self, capacity: u32) -> u32 {
        let per_repeat = self
            .blueprint
            .pattern
            .iter()
            .filter(|p| **p == BodyPart::Work)
            .count() as u32;
        (self.blueprint.repeats_for(capacity) * per_repeat).max(1)
    }

    /// Harvesters a source wants, bounded by its free tiles.
    fn per_source(&self, slots: u32, capacity: u32) -> u32 {
        let wanted = WORK_PER_SOURCE.div_ceil(self.work_per_body(capacity));
        wanted.min(slots).max(1)
    }
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}

impl Role for Harvester {
    fn kind(&self) -> RoleKind {
        RoleKind::Harvester
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        colony
            .sources
            .iter()
            .map(|s| self.per_source(s.slots, colony.energy_capacity))
            .sum()
    }

    fn find_task(
        &self,
        _agent: &Agent,
        creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        let mut sources: Vec<_> = ctx.room.sources.iter().collect();
        sources.sort_by_key(|s| (s.pos.range_to(&creep.pos), s.id.clone()));

        sources.into_iter().find_map(|source| {
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                source.id.clone(),
                TaskKind::Harvest,
                self.per_source(source.slots, ctx.room.energy_capacity),
                Some(TaskPayload::Spot(source.pos.clone())),
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        ctx.room.source(task.target()).is_some()
    }

    fn execute(
        &self,
        agent: &mut Agent,
        creep: &Creep,
        task: Option<&mut Task>,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    ) {
        let Some(task) = task else {
            if !creep.is_empty() {
                deposit(agent, creep, ctx, actions);
            }
            return;
        };

        let Some(source) = ctx.room.source(task.target()) else {
            task.finish();
            return;
        };

        match sync_mode(agent, creep) {
            Mode::Gathering => {
                let outcome = actions.harvest(&agent.name, &source.id);
                approach(actions, agent, outcome, &source.pos, 1);
            }
            Mode::Working => {
                // A container next to the source comes first
                let container = ctx.room.structures.iter().find(|s| {
                    s.kind == StructureKind::Container
                        && s.pos.in_range(&source.pos, 1)
                        && s.free_capacity() > 0
                });
                if let Some(container) = container {
                    let outcome = actions.transfer(&agent.name, &container.id);
                    approach(actions, agent, outcome, &container.pos, 1);
                } else if !deposit(agent, creep, ctx, actions) {
                    // Nowhere to put it; haulers will pick it up
                    actions.drop_energy(&agent.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::context::SourceSummary;
    use crate::roles::testing::*;
    use crate::IntentBuffer;
    use colony_core::{Intent, ObjectId};

    #[test]
    fn demand_scales_with_body_size() {
        let role = Harvester::new();
        let mut colony = ColonySnapshot {
            sources: vec![
                SourceSummary { id: ObjectId::new("a"), slots: 1 },
                SourceSummary { id: ObjectId::new("b"), slots: 4 },
            ],
            energy_capacity: 300,
            ..Default::default()
        };
        // 1 WORK per body: source a capped by its single slot, b wants 5 but has 4
        assert_eq!(role.demand(&colony), 1 + 4);

        // 5 WORK per body: one harvester per source
        colony.energy_capacity = 1000;
        assert_eq!(role.demand(&colony), 2);

        colony.sources.clear();
        assert_eq!(role.demand(&colony), 0);
    }

    #[test]
    fn finds_nearest_untaken_source() {
        let miner = worker("m", pos(12, 12), 0);
        let world = world(room(), vec![miner.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&miner.pos.room).unwrap(), &config);
        let role = Harvester::new();
        let mut registry = TaskRegistry::new();

        let task = role.find_task(&agent("m", RoleKind::Harvester), &miner, &registry, &ctx).unwrap();
        assert_eq!(task.target().as_str(), "src-near");
        assert_eq!(task.limit, 1);

        // Nearest source is full now, the far one has three slots
        let mut other = agent("m0", RoleKind::Harvester);
        registry.assign(&mut other, task);
        let next = role.find_task(&agent("m", RoleKind::Harvester), &miner, &registry, &ctx).unwrap();
        assert_eq!(next.target().as_str(), "src-far");
        assert_eq!(next.limit, 3);
    }

    #[test]
    fn harvests_then_delivers() {
        let role = Harvester::new();
        let config = OrchestratorConfig::default();
        let mut task = TaskRegistry::create(
            colony_core::RoomName::new("R"),
            ObjectId::new("src-near"),
            TaskKind::Harvest,
            1,
            None,
        );

        let empty = worker("m", pos(11, 11), 0);
        let world1 = world(room(), vec![empty.clone()]);
        let ctx = CycleContext::new(&world1, world1.room(&empty.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world1);
        let mut miner = agent("m", RoleKind::Harvester);
        role.execute(&mut miner, &empty, Some(&mut task), &ctx, &mut buf);
        assert_eq!(
            buf.intents(),
            &[Intent::Harvest { agent: empty.name.clone(), source: ObjectId::new("src-near") }]
        );

        let full = worker("m", pos(24, 24), 50);
        let world2 = world(room(), vec![full.clone()]);
        let ctx = CycleContext::new(&world2, world2.room(&full.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world2);
        role.execute(&mut miner, &full, Some(&mut task), &ctx, &mut buf);
        assert_eq!(miner.mode, Mode::Working);
        assert_eq!(
            buf.intents(),
            &[Intent::Transfer { agent: full.name.clone(), target: ObjectId::new("spawn1") }]
        );
        assert!(!task.complete);
    }

    #[test]
    fn vanished_source_finishes_task() {
        let role = Harvester::new();
        let config = OrchestratorConfig::default();
        let mut task = TaskRegistry::create(
            colony_core::RoomName::new("R"),
            ObjectId::new("gone"),
            TaskKind::Harvest,
            1,
            None,
        );
        let miner = worker("m", pos(11, 11), 0);
        let world = world(room(), vec![miner.clone()]);
        let ctx = CycleContext::new(&world, world.room(&miner.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);

        assert!(!role.is_task_valid(&agent("m", RoleKind::Harvester), &task, &ctx));
        role.execute(&mut agent("m", RoleKind::Harvester), &miner, Some(&mut task), &ctx, &mut buf);
        assert!(task.complete);
        assert!(buf.intents().is_empty());
    }
}
