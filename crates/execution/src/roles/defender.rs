//! Defender - engages hostiles in the home room.

use colony_core::{
    ActionOutcome, Actuator, Agent, BodyBlueprint, BodyPart, Creep, RoleKind, Task, TaskKind,
};

use super::common::approach;
use super::Role;
use crate::context::{ColonySnapshot, CycleContext};
use crate::registry::TaskRegistry;

/// Attacks hostiles, nearest first, in pairs.
pub struct Defender {
    blueprint: BodyBlueprint,
    cap: u32,
}

impl Defender {
    /// Create the role with a population cap.
    pub fn new(cap: u32) -> Self {
        Self {
            // Tough parts up front soak damage before anything else is hit
            blueprint: BodyBlueprint::new(vec![BodyPart::Tough, BodyPart::Attack, BodyPart::Move], 6)
                .ordered(),
            cap,
        }
    }
}

impl Role for Defender {
    fn kind(&self) -> RoleKind {
        RoleKind::Defender
    }

    fn blueprint(&self) -> &BodyBlueprint {
        &self.blueprint
    }

    fn demand(&self, colony: &ColonySnapshot) -> u32 {
        colony.hostiles.min(self.cap)
    }

    fn find_task(
        &self,
        _agent: &Agent,
        creep: &Creep,
        registry: &TaskRegistry,
        ctx: &CycleContext<'_>,
    ) -> Option<Task> {
        let mut hostiles: Vec<_> = ctx.room.hostiles.iter().collect();
        hostiles.sort_by_key(|h| (h.pos.range_to(&creep.pos), h.id.clone()));

        hostiles.into_iter().find_map(|hostile| {
            let task = TaskRegistry::create(
                ctx.room.name.clone(),
                hostile.id.clone(),
                TaskKind::Attack,
                TaskKind::Attack.default_limit(),
                None,
            );
            (!registry.is_taken(&task.id)).then_some(task)
        })
    }

    fn is_task_valid(&self, _agent: &Agent, task: &Task, ctx: &CycleContext<'_>) -> bool {
        ctx.room.hostile(task.target()).is_some()
    }

    fn execute(
        &self,
        agent: &mut Agent,
        _creep: &Creep,
        task: Option<&mut Task>,
        ctx: &CycleContext<'_>,
        actions: &mut dyn Actuator,
    ) {
        let Some(task) = task else {
            return;
        };
        let Some(hostile) = ctx.room.hostile(task.target()) else {
            task.finish();
            return;
        };

        let outcome = actions.attack(&agent.name, &hostile.id);
        if approach(actions, agent, outcome, &hostile.pos, 1) == ActionOutcome::InvalidTarget {
            task.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::roles::testing::*;
    use crate::IntentBuffer;
    use colony_core::{Hostile, Intent, ObjectId, RoomState};

    fn fighter(name: &str, x: u8, y: u8) -> Creep {
        creep(name, pos(x, y), vec![BodyPart::Tough, BodyPart::Attack, BodyPart::Move], 0)
    }

    fn room_with_raiders() -> RoomState {
        let mut room = room();
        room.hostiles.push(Hostile { id: ObjectId::new("raider-a"), pos: pos(45, 5), hits: 300 });
        room.hostiles.push(Hostile { id: ObjectId::new("raider-b"), pos: pos(26, 26), hits: 300 });
        room
    }

    #[test]
    fn demand_matches_hostiles_up_to_cap() {
        let role = Defender::new(3);
        let mut colony = ColonySnapshot::default();
        assert_eq!(role.demand(&colony), 0);
        colony.hostiles = 2;
        assert_eq!(role.demand(&colony), 2);
        colony.hostiles = 9;
        assert_eq!(role.demand(&colony), 3);
    }

    #[test]
    fn body_groups_tough_parts_first() {
        let body = Defender::new(3).build_body(300);
        // 140 per repeat, two repeats
        assert_eq!(
            body,
            vec![
                BodyPart::Tough,
                BodyPart::Tough,
                BodyPart::Attack,
                BodyPart::Attack,
                BodyPart::Move,
                BodyPart::Move,
            ]
        );
    }

    #[test]
    fn pairs_up_on_the_nearest_hostile() {
        let me = fighter("d", 24, 24);
        let world = world(room_with_raiders(), vec![me.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&me.pos.room).unwrap(), &config);
        let role = Defender::new(3);
        let mut registry = TaskRegistry::new();

        for name in ["d1", "d2"] {
            let mut defender = agent(name, RoleKind::Defender);
            let task = role.find_task(&defender, &me, &registry, &ctx).unwrap();
            assert_eq!(task.target().as_str(), "raider-b");
            registry.assign(&mut defender, task);
        }
        let third = role.find_task(&agent("d3", RoleKind::Defender), &me, &registry, &ctx).unwrap();
        assert_eq!(third.target().as_str(), "raider-a");
    }

    #[test]
    fn closes_in_then_attacks() {
        let far = fighter("d", 20, 20);
        let near = fighter("e", 25, 25);
        let world = world(room_with_raiders(), vec![far.clone(), near.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&far.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);
        let role = Defender::new(3);
        let target = ObjectId::new("raider-b");
        let mut task =
            TaskRegistry::create(colony_core::RoomName::new("R"), target.clone(), TaskKind::Attack, 2, None);

        role.execute(&mut agent("d", RoleKind::Defender), &far, Some(&mut task), &ctx, &mut buf);
        role.execute(&mut agent("e", RoleKind::Defender), &near, Some(&mut task), &ctx, &mut buf);
        assert_eq!(
            buf.intents(),
            &[
                Intent::Move { agent: far.name.clone(), to: pos(26, 26) },
                Intent::Attack { agent: near.name.clone(), target },
            ]
        );
        assert!(!task.complete);
    }
}
