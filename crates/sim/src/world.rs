//! Simulated world: carries out intents and advances time.
//!
//! The simulation is deliberately coarse. Movement is one diagonal step per
//! cycle with no terrain, and every intent is re-checked against the live
//! state when it is applied, so an intent made stale by an earlier one in
//! the same batch is skipped instead of failing the batch.

use std::collections::BTreeMap;

use colony_core::{
    body_cost, AgentId, BodyPart, Creep, DroppedEnergy, Hostile, Intent, ObjectId, Position,
    RoomName, RoomState, Spawn, Structure, StructureKind, WorldSnapshot, AGENT_LIFETIME,
    ATTACK_POWER, BUILD_POWER, HARVEST_POWER, REPAIR_POWER, SPAWN_TIME_PER_PART, UPGRADE_POWER,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Cycles between source refills.
const SOURCE_REGEN: u64 = 300;

/// Below this much room energy, spawns trickle-charge by one per cycle.
const TRICKLE_BELOW: u32 = 300;

/// Cycles between road wear.
const ROAD_WEAR_EVERY: u64 = 1000;

/// Hits a road loses per wear step.
const ROAD_WEAR: u32 = 100;

/// Upgrade progress needed to leave each controller level.
const CONTROLLER_PROGRESS: [u32; 7] = [200, 45_000, 135_000, 405_000, 1_215_000, 3_645_000, 10_935_000];

/// A body being produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SpawnJob {
    spawn: ObjectId,
    room: RoomName,
    name: AgentId,
    remaining: u32,
}

/// How many intents of a batch took effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Intents carried out
    pub applied: usize,
    /// Intents that no longer made sense
    pub skipped: usize,
}

/// A world that owns its state and changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimWorld {
    state: WorldSnapshot,
    #[serde(default)]
    jobs: Vec<SpawnJob>,
    #[serde(default)]
    next_object: u64,
}

impl SimWorld {
    /// Wrap an initial state.
    pub fn new(state: WorldSnapshot) -> Self {
        let mut world = Self {
            state,
            jobs: Vec::new(),
            next_object: 0,
        };
        world.refresh_energy();
        world
    }

    /// Current global time step.
    pub fn time(&self) -> u64 {
        self.state.time
    }

    /// Live state.
    pub fn state(&self) -> &WorldSnapshot {
        &self.state
    }

    /// A copy of the current state for one cycle.
    pub fn snapshot(&self) -> WorldSnapshot {
        self.state.clone()
    }

    /// Bodies still being produced.
    pub fn spawning(&self) -> usize {
        self.jobs.len()
    }

    /// Put a hostile in a room. Returns false if the room is unknown.
    pub fn add_hostile(&mut self, room: &RoomName, hostile: Hostile) -> bool {
        match self.state.rooms.get_mut(room) {
            Some(state) => {
                state.hostiles.push(hostile);
                true
            }
            None => false,
        }
    }

    /// Carry out a batch of intents in order.
    pub fn apply(&mut self, intents: &[Intent]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for intent in intents {
            if self.apply_one(intent) {
                report.applied += 1;
            } else {
                trace!("skipped {:?}", intent);
                report.skipped += 1;
            }
        }
        self.refresh_energy();
        report
    }

    /// Apply a batch, then move time forward one step.
    pub fn step(&mut self, intents: &[Intent]) -> ApplyReport {
        let report = self.apply(intents);
        self.advance();
        report
    }

    /// Move time forward one step.
    pub fn advance(&mut self) {
        self.state.time += 1;
        let time = self.state.time;

        self.finish_spawns();
        self.age_creeps();

        for room in self.state.rooms.values_mut() {
            if time % SOURCE_REGEN == 0 {
                for source in &mut room.sources {
                    source.energy = source.capacity;
                }
            }
            if time % ROAD_WEAR_EVERY == 0 {
                for road in room.structures.iter_mut().filter(|s| s.kind == StructureKind::Road) {
                    road.hits = road.hits.saturating_sub(ROAD_WEAR).max(1);
                }
            }
        }

        self.refresh_energy();
        for room in self.state.rooms.values_mut() {
            if room.energy_available < TRICKLE_BELOW {
                for spawn in room.spawns.iter_mut().filter(|s| s.free_capacity() > 0) {
                    spawn.store += 1;
                }
            }
        }
        self.refresh_energy();
    }

    fn finish_spawns(&mut self) {
        let mut done = Vec::new();
        for job in &mut self.jobs {
            job.remaining = job.remaining.saturating_sub(1);
            if job.remaining == 0 {
                done.push(job.clone());
            }
        }
        self.jobs.retain(|job| job.remaining > 0);

        for job in done {
            if let Some(creep) = self.state.creeps.get_mut(&job.name) {
                creep.spawning = false;
                creep.ticks_to_live = Some(AGENT_LIFETIME);
            }
            let point = self
                .state
                .rooms
                .get_mut(&job.room)
                .and_then(|room| room.spawns.iter_mut().find(|s| s.id == job.spawn));
            if let Some(point) = point {
                point.spawning = None;
            }
            debug!("{} left {}", job.name, job.spawn);
        }
    }

    fn age_creeps(&mut self) {
        let mut expired = Vec::new();
        for creep in self.state.creeps.values_mut() {
            if let Some(ttl) = creep.ticks_to_live.as_mut() {
                *ttl = ttl.saturating_sub(1);
                if *ttl == 0 {
                    expired.push(creep.name.clone());
                }
            }
        }

        for name in expired {
            if let Some(creep) = self.state.creeps.remove(&name) {
                debug!("{} expired", name);
                if creep.energy > 0 {
                    self.drop_at(&creep.pos, creep.energy);
                }
            }
        }
    }

    fn refresh_energy(&mut self) {
        for room in self.state.rooms.values_mut() {
            let extensions = room
                .structures
                .iter()
                .filter(|s| s.kind == StructureKind::Extension);
            room.energy_available = room.spawns.iter().map(|s| s.store).sum::<u32>()
                + extensions.clone().map(|s| s.store).sum::<u32>();
            room.energy_capacity = room.spawns.iter().map(|s| s.store_capacity).sum::<u32>()
                + extensions.map(|s| s.store_capacity).sum::<u32>();
        }
    }

    fn drop_at(&mut self, pos: &Position, amount: u32) {
        let id = ObjectId::new(format!("drop-{}", self.next_object));
        let Some(room) = self.state.rooms.get_mut(&pos.room) else {
            return;
        };
        match room.dropped.iter_mut().find(|d| d.pos == *pos) {
            Some(pile) => pile.amount += amount,
            None => {
                self.next_object += 1;
                room.dropped.push(DroppedEnergy { id, pos: pos.clone(), amount });
            }
        }
    }

    fn apply_one(&mut self, intent: &Intent) -> bool {
        match intent {
            Intent::Move { agent, to } => match self.state.creeps.get_mut(agent) {
                Some(creep) if !creep.spawning && creep.parts(BodyPart::Move) > 0 => {
                    creep.pos = creep.pos.step_toward(to);
                    true
                }
                _ => false,
            },
            Intent::Drop { agent } => {
                let Some(creep) = self.state.creeps.get_mut(agent).filter(|c| !c.spawning) else {
                    return false;
                };
                let amount = std::mem::take(&mut creep.energy);
                let pos = creep.pos.clone();
                if amount == 0 {
                    return false;
                }
                self.drop_at(&pos, amount);
                true
            }
            Intent::Recycle { agent, spawn } => self.recycle(agent, spawn),
            Intent::Spawn { spawn, name, body } => self.spawn(spawn, name, body),
            _ => {
                let WorldSnapshot { rooms, creeps, .. } = &mut self.state;
                let Some(agent) = intent.agent() else {
                    return false;
                };
                let Some(creep) = creeps.get_mut(agent).filter(|c| !c.spawning) else {
                    return false;
                };
                let Some(room) = rooms.get_mut(&creep.pos.room) else {
                    return false;
                };
                act(intent, creep, room)
            }
        }
    }

    fn recycle(&mut self, agent: &AgentId, spawn: &ObjectId) -> bool {
        let in_reach = self.state.creeps.get(agent).is_some_and(|creep| {
            self.state
                .room(&creep.pos.room)
                .and_then(|room| room.spawn(spawn))
                .is_some_and(|point| creep.pos.in_range(&point.pos, 1))
        });
        if !in_reach {
            return false;
        }
        let Some(creep) = self.state.creeps.remove(agent) else {
            return false;
        };

        let refund = creep.energy + body_cost(&creep.body) / 4;
        let point = self
            .state
            .rooms
            .get_mut(&creep.pos.room)
            .and_then(|room| room.spawns.iter_mut().find(|s| &s.id == spawn));
        if let Some(point) = point {
            point.store = (point.store + refund).min(point.store_capacity);
        }
        debug!("{} recycled at {}", agent, spawn);
        true
    }

    fn spawn(&mut self, spawn: &ObjectId, name: &AgentId, body: &[BodyPart]) -> bool {
        if body.is_empty() || self.state.creeps.contains_key(name) {
            return false;
        }
        let Some(room) = self.state.rooms.values_mut().find(|r| r.spawn(spawn).is_some()) else {
            return false;
        };
        let cost = body_cost(body);
        if cost > room.energy_available {
            return false;
        }
        let Some(point) = room.spawns.iter_mut().find(|s| &s.id == spawn && s.is_idle()) else {
            return false;
        };
        point.spawning = Some(name.clone());
        let pos = point.pos.clone();
        draw_energy(room, cost);

        self.jobs.push(SpawnJob {
            spawn: spawn.clone(),
            room: room.name.clone(),
            name: name.clone(),
            remaining: body.len() as u32 * SPAWN_TIME_PER_PART,
        });
        self.state.creeps.insert(
            name.clone(),
            Creep {
                name: name.clone(),
                pos,
                body: body.to_vec(),
                energy: 0,
                ticks_to_live: None,
                spawning: true,
            },
        );
        debug!("{} started {} for {}", spawn, name, cost);
        true
    }
}

/// Take `cost` energy from spawns first, then extensions.
fn draw_energy(room: &mut RoomState, cost: u32) {
    room.energy_available = room.energy_available.saturating_sub(cost);
    let mut cost = cost;
    for spawn in &mut room.spawns {
        let take = spawn.store.min(cost);
        spawn.store -= take;
        cost -= take;
    }
    for ext in room.structures.iter_mut().filter(|s| s.kind == StructureKind::Extension) {
        let take = ext.store.min(cost);
        ext.store -= take;
        cost -= take;
    }
}

/// Carry out an in-room action for one creep.
fn act(intent: &Intent, creep: &mut Creep, room: &mut RoomState) -> bool {
    let work = creep.parts(BodyPart::Work);
    match intent {
        Intent::Harvest { source, .. } => {
            let Some(source) = room.sources.iter_mut().find(|s| &s.id == source) else {
                return false;
            };
            if !creep.pos.in_range(&source.pos, 1) {
                return false;
            }
            let amount = (work * HARVEST_POWER).min(source.energy).min(creep.free_capacity());
            source.energy -= amount;
            creep.energy += amount;
            amount > 0
        }
        Intent::Pickup { target, .. } => {
            let Some(pile) = room.dropped.iter_mut().find(|d| &d.id == target) else {
                return false;
            };
            if !creep.pos.in_range(&pile.pos, 1) {
                return false;
            }
            let amount = pile.amount.min(creep.free_capacity());
            pile.amount -= amount;
            creep.energy += amount;
            room.dropped.retain(|d| d.amount > 0);
            amount > 0
        }
        Intent::Withdraw { target, .. } => {
            let Some(store) = room
                .structures
                .iter_mut()
                .find(|s| &s.id == target && s.kind.is_store())
            else {
                return false;
            };
            if !creep.pos.in_range(&store.pos, 1) {
                return false;
            }
            let amount = store.store.min(creep.free_capacity());
            store.store -= amount;
            creep.energy += amount;
            amount > 0
        }
        Intent::Transfer { target, .. } => {
            let (pos, store, capacity) = if let Some(point) = room.spawns.iter_mut().find(|s| &s.id == target) {
                (&point.pos, &mut point.store, point.store_capacity)
            } else if let Some(s) = room.structures.iter_mut().find(|s| &s.id == target) {
                (&s.pos, &mut s.store, s.store_capacity)
            } else {
                return false;
            };
            if !creep.pos.in_range(pos, 1) {
                return false;
            }
            let amount = creep.energy.min(capacity.saturating_sub(*store));
            *store += amount;
            creep.energy -= amount;
            amount > 0
        }
        Intent::Build { site, .. } => {
            let Some(index) = room.sites.iter().position(|s| &s.id == site) else {
                return false;
            };
            let target = &mut room.sites[index];
            if !creep.pos.in_range(&target.pos, 3) {
                return false;
            }
            let amount = (work * BUILD_POWER).min(creep.energy).min(target.remaining());
            if amount == 0 {
                return false;
            }
            target.progress += amount;
            creep.energy -= amount;
            if target.remaining() == 0 {
                let done = room.sites.remove(index);
                complete_site(room, done.id, done.pos, done.kind);
            }
            true
        }
        Intent::Repair { target, .. } => {
            let Some(structure) = room.structures.iter_mut().find(|s| &s.id == target) else {
                return false;
            };
            if !creep.pos.in_range(&structure.pos, 3) {
                return false;
            }
            let missing = structure.hits_max.saturating_sub(structure.hits);
            let cost = (work * REPAIR_POWER).min(missing).div_ceil(REPAIR_POWER).min(creep.energy);
            if cost == 0 {
                return false;
            }
            structure.hits = (structure.hits + cost * REPAIR_POWER).min(structure.hits_max);
            creep.energy -= cost;
            true
        }
        Intent::Upgrade { controller, .. } => {
            let Some(ctrl) = room.controller.as_mut().filter(|c| &c.id == controller && c.owned) else {
                return false;
            };
            if !creep.pos.in_range(&ctrl.pos, 3) {
                return false;
            }
            let spent = (work * UPGRADE_POWER).min(creep.energy);
            if spent == 0 {
                return false;
            }
            creep.energy -= spent;
            ctrl.progress += spent;
            while let Some(needed) = CONTROLLER_PROGRESS.get(ctrl.level.saturating_sub(1) as usize) {
                if ctrl.progress < *needed {
                    break;
                }
                ctrl.progress -= needed;
                ctrl.level += 1;
                debug!("{} reached level {}", ctrl.id, ctrl.level);
            }
            true
        }
        Intent::Attack { target, .. } => {
            let Some(hostile) = room.hostiles.iter_mut().find(|h| &h.id == target) else {
                return false;
            };
            if !creep.pos.in_range(&hostile.pos, 1) {
                return false;
            }
            hostile.hits = hostile.hits.saturating_sub(creep.parts(BodyPart::Attack) * ATTACK_POWER);
            room.hostiles.retain(|h| h.hits > 0);
            true
        }
        _ => false,
    }
}

/// Replace a finished construction site with what it was building.
fn complete_site(room: &mut RoomState, id: ObjectId, pos: Position, kind: StructureKind) {
    debug!("{} finished as {:?}", id, kind);
    if kind == StructureKind::Spawn {
        room.spawns.push(Spawn {
            id,
            pos,
            store: 0,
            store_capacity: 300,
            spawning: None,
        });
        return;
    }

    let (hits_max, store_capacity) = match kind {
        StructureKind::Extension => (1_000, 50),
        StructureKind::Tower => (3_000, 1_000),
        StructureKind::Container => (5_000, 2_000),
        StructureKind::Storage => (10_000, 1_000_000),
        StructureKind::Road => (5_000, 0),
        StructureKind::Wall | StructureKind::Rampart => (10_000, 0),
        StructureKind::Spawn => (5_000, 300),
    };
    let hits = match kind {
        StructureKind::Wall | StructureKind::Rampart => 1,
        _ => hits_max,
    };
    room.structures.push(Structure {
        id,
        pos,
        kind,
        hits,
        hits_max,
        store: 0,
        store_capacity,
    });
}

/// Number of creeps per room, for summaries.
pub fn census(world: &WorldSnapshot) -> BTreeMap<RoomName, usize> {
    let mut counts = BTreeMap::new();
    for creep in world.creeps.values() {
        *counts.entry(creep.pos.room.clone()).or_insert(0) += 1;
    }
    counts
}
