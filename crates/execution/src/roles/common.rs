//! Routines shared by several roles.

use colony_core::{ActionOutcome, Actuator, Agent, BodyPart, Creep, Mode, Position};
use tracing::trace;

use crate::context::{nearest, CycleContext};

/// Smallest store or pile worth walking to when refilling.
const MIN_REFILL: u32 = 50;

/// Mode the agent should be in given what it carries, without changing it.
pub fn effective_mode(agent: &Agent, creep: &Creep) -> Mode {
    match agent.mode {
        Mode::Gathering if creep.carry_capacity() > 0 && creep.is_full() => Mode::Working,
        Mode::Working if creep.is_empty() => Mode::Gathering,
        mode => mode,
    }
}

/// Flip the agent's mode when it has filled up or run dry.
pub fn sync_mode(agent: &mut Agent, creep: &Creep) -> Mode {
    let mode = effective_mode(agent, creep);
    if mode != agent.mode {
        trace!("{} switches to {:?}", agent.name, mode);
        agent.mode = mode;
    }
    mode
}

/// Move toward `pos` if `outcome` says the target was out of reach.
pub fn approach(
    actions: &mut dyn Actuator,
    agent: &Agent,
    outcome: ActionOutcome,
    pos: &Position,
    range: u32,
) -> ActionOutcome {
    if outcome == ActionOutcome::NotInRange {
        actions.move_to(&agent.name, pos, range);
    }
    outcome
}

/// Fetch energy from the cheapest place: a store, a pile, or a source.
///
/// Returns false when there is nowhere to get energy from.
pub fn refill(
    agent: &Agent,
    creep: &Creep,
    ctx: &CycleContext<'_>,
    actions: &mut dyn Actuator,
) -> bool {
    let stores: Vec<_> = ctx
        .stores()
        .iter()
        .filter(|s| s.amount >= MIN_REFILL)
        .cloned()
        .collect();
    if let Some(store) = nearest(&stores, &creep.pos) {
        let outcome = actions.withdraw(&agent.name, &store.id);
        approach(actions, agent, outcome, &store.pos, 1);
        return true;
    }

    let piles: Vec<_> = ctx
        .piles()
        .iter()
        .filter(|p| p.amount >= MIN_REFILL)
        .cloned()
        .collect();
    if let Some(pile) = nearest(&piles, &creep.pos) {
        let outcome = actions.pickup(&agent.name, &pile.id);
        approach(actions, agent, outcome, &pile.pos, 1);
        return true;
    }

    if creep.parts(BodyPart::Work) == 0 {
        return false;
    }
    let source = ctx
        .room
        .sources
        .iter()
        .filter(|s| s.energy > 0)
        .min_by_key(|s| (s.pos.range_to(&creep.pos), s.id.clone()));
    match source {
        Some(source) => {
            let outcome = actions.harvest(&agent.name, &source.id);
            approach(actions, agent, outcome, &source.pos, 1);
            true
        }
        None => false,
    }
}

/// Carry energy to the nearest spawn, extension or tower, else storage.
///
/// Returns false when nothing can take energy.
pub fn deposit(
    agent: &Agent,
    creep: &Creep,
    ctx: &CycleContext<'_>,
    actions: &mut dyn Actuator,
) -> bool {
    let target = nearest(ctx.sinks(), &creep.pos).cloned().or_else(|| ctx.storage());
    match target {
        Some(target) => {
            let outcome = actions.transfer(&agent.name, &target.id);
            approach(actions, agent, outcome, &target.pos, 1);
            true
        }
        None => false,
    }
}

/// End-of-life routine: hand over carried energy, then get recycled.
pub fn dispose(agent: &Agent, creep: &Creep, ctx: &CycleContext<'_>, actions: &mut dyn Actuator) {
    if !creep.is_empty() && deposit(agent, creep, ctx, actions) {
        return;
    }

    let spawn = ctx
        .room
        .spawns
        .iter()
        .min_by_key(|s| (s.pos.range_to(&creep.pos), s.id.clone()));
    if let Some(spawn) = spawn {
        let outcome = actions.recycle(&agent.name, &spawn.id);
        approach(actions, agent, outcome, &spawn.pos, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::roles::testing::*;
    use crate::IntentBuffer;
    use colony_core::{
        DroppedEnergy, Intent, ObjectId, RoleKind, Structure, StructureKind,
    };

    #[test]
    fn mode_flips_on_full_and_empty() {
        let mut agent = agent("u", RoleKind::Upgrader);
        let full = worker("u", pos(1, 1), 50);
        let empty = worker("u", pos(1, 1), 0);

        assert_eq!(sync_mode(&mut agent, &full), Mode::Working);
        assert_eq!(sync_mode(&mut agent, &full), Mode::Working);
        assert_eq!(sync_mode(&mut agent, &empty), Mode::Gathering);
    }

    #[test]
    fn refill_prefers_stores_over_sources() {
        let mut room = room();
        room.structures.push(Structure {
            id: ObjectId::new("box"),
            pos: pos(30, 30),
            kind: StructureKind::Container,
            hits: 1000,
            hits_max: 1000,
            store: 500,
            store_capacity: 2000,
        });
        let creep = worker("u", pos(11, 11), 0);
        let world = world(room, vec![creep.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&creep.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);

        assert!(refill(&agent("u", RoleKind::Upgrader), &creep, &ctx, &mut buf));
        assert_eq!(
            buf.intents(),
            &[Intent::Move { agent: creep.name.clone(), to: pos(30, 30) }]
        );
    }

    #[test]
    fn refill_falls_back_to_piles_then_sources() {
        let mut room = room();
        room.dropped.push(DroppedEnergy { id: ObjectId::new("pile"), pos: pos(12, 12), amount: 80 });
        let creep = worker("u", pos(11, 11), 0);
        let world = world(room, vec![creep.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&creep.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);

        assert!(refill(&agent("u", RoleKind::Upgrader), &creep, &ctx, &mut buf));
        assert_eq!(
            buf.intents(),
            &[Intent::Pickup { agent: creep.name.clone(), target: ObjectId::new("pile") }]
        );
    }

    #[test]
    fn dispose_recycles_when_empty() {
        let creep = worker("old", pos(24, 24), 0);
        let world = world(room(), vec![creep.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&creep.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);

        dispose(&agent("old", RoleKind::Builder), &creep, &ctx, &mut buf);
        assert_eq!(
            buf.intents(),
            &[Intent::Recycle { agent: creep.name.clone(), spawn: ObjectId::new("spawn1") }]
        );
    }

    #[test]
    fn dispose_delivers_first() {
        let creep = worker("old", pos(24, 24), 40);
        let world = world(room(), vec![creep.clone()]);
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, world.room(&creep.pos.room).unwrap(), &config);
        let mut buf = IntentBuffer::new(&world);

        dispose(&agent("old", RoleKind::Builder), &creep, &ctx, &mut buf);
        assert_eq!(
            buf.intents(),
            &[Intent::Transfer { agent: creep.name.clone(), target: ObjectId::new("spawn1") }]
        );
    }
}
