//! Per-cycle scratch context.
//!
//! A [`CycleContext`] is created at the start of a colony's cycle and dropped
//! at its end. Lookups that several agents repeat (energy sinks, damaged
//! structures, the colony summary) are computed lazily and memoized here, so
//! no cache ever outlives the snapshot it was computed from.

use std::cell::OnceCell;

use colony_core::{
    ObjectId, Position, RoomState, Structure, StructureKind, WorldSnapshot,
};

use crate::config::OrchestratorConfig;

/// Where an energy target lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A spawn point
    Spawn,
    /// A structure of the given kind
    Structure(StructureKind),
    /// A pile on the ground
    Pile,
}

/// Something energy can be taken from or put into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyTarget {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Energy held
    pub amount: u32,
    /// Room for more energy
    pub free: u32,
    /// What it is
    pub kind: TargetKind,
}

/// Summary of one source for demand calculations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    /// Source id
    pub id: ObjectId,
    /// Walkable tiles around it
    pub slots: u32,
}

/// Colony state as seen by role demand functions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColonySnapshot {
    /// Energy sources in the home room
    pub sources: Vec<SourceSummary>,
    /// Energy on hand for spawning
    pub energy_available: u32,
    /// Full spawning capacity
    pub energy_capacity: u32,
    /// Energy in containers and storage
    pub stored_energy: u32,
    /// Energy lying on the ground
    pub dropped_energy: u32,
    /// Number of construction sites
    pub construction_sites: u32,
    /// Build progress still needed across all sites
    pub build_remaining: u32,
    /// Structures below the repair threshold
    pub damaged_structures: u32,
    /// Hostile units present
    pub hostiles: u32,
    /// Controller level if the colony owns the controller
    pub controller_level: Option<u8>,
}

impl ColonySnapshot {
    /// Summarize a room.
    pub fn capture(room: &RoomState, repair_threshold: f64) -> Self {
        Self {
            sources: room
                .sources
                .iter()
                .map(|s| SourceSummary { id: s.id.clone(), slots: s.slots })
                .collect(),
            energy_available: room.energy_available,
            energy_capacity: room.energy_capacity,
            stored_energy: room.stored_energy(),
            dropped_energy: room.dropped.iter().map(|d| d.amount).sum(),
            construction_sites: room.sites.len() as u32,
            build_remaining: room.sites.iter().map(|s| s.remaining()).sum(),
            damaged_structures: room
                .structures
                .iter()
                .filter(|s| s.hit_ratio() < repair_threshold)
                .count() as u32,
            hostiles: room.hostiles.len() as u32,
            controller_level: room.controller.as_ref().filter(|c| c.owned).map(|c| c.level),
        }
    }
}

/// Scratch context for one colony cycle.
pub struct CycleContext<'a> {
    /// The snapshot for this cycle
    pub world: &'a WorldSnapshot,
    /// The colony's home room
    pub room: &'a RoomState,
    /// Tuning inputs
    pub config: &'a OrchestratorConfig,
    sinks: OnceCell<Vec<EnergyTarget>>,
    stores: OnceCell<Vec<EnergyTarget>>,
    piles: OnceCell<Vec<EnergyTarget>>,
    damaged: OnceCell<Vec<&'a Structure>>,
    summary: OnceCell<ColonySnapshot>,
}

impl<'a> CycleContext<'a> {
    /// Create an empty scratch context.
    pub fn new(world: &'a WorldSnapshot, room: &'a RoomState, config: &'a OrchestratorConfig) -> Self {
        Self {
            world,
            room,
            config,
            sinks: OnceCell::new(),
            stores: OnceCell::new(),
            piles: OnceCell::new(),
            damaged: OnceCell::new(),
            summary: OnceCell::new(),
        }
    }

    /// Current global time step.
    pub fn time(&self) -> u64 {
        self.world.time
    }

    /// Spawns, extensions and towers that can take energy.
    pub fn sinks(&self) -> &[EnergyTarget] {
        self.sinks.get_or_init(|| {
            let spawns = self.room.spawns.iter().filter(|s| s.free_capacity() > 0).map(|s| {
                EnergyTarget {
                    id: s.id.clone(),
                    pos: s.pos.clone(),
                    amount: s.store,
                    free: s.free_capacity(),
                    kind: TargetKind::Spawn,
                }
            });
            let structures = self
                .room
                .structures
                .iter()
                .filter(|s| s.kind.is_sink() && s.free_capacity() > 0)
                .map(structure_target);
            spawns.chain(structures).collect()
        })
    }

    /// Containers and storage holding energy.
    pub fn stores(&self) -> &[EnergyTarget] {
        self.stores.get_or_init(|| {
            self.room
                .structures
                .iter()
                .filter(|s| s.kind.is_store() && s.store > 0)
                .map(structure_target)
                .collect()
        })
    }

    /// Dropped energy piles.
    pub fn piles(&self) -> &[EnergyTarget] {
        self.piles.get_or_init(|| {
            self.room
                .dropped
                .iter()
                .filter(|d| d.amount > 0)
                .map(|d| EnergyTarget {
                    id: d.id.clone(),
                    pos: d.pos.clone(),
                    amount: d.amount,
                    free: 0,
                    kind: TargetKind::Pile,
                })
                .collect()
        })
    }

    /// The room's storage structure, if it has room left.
    pub fn storage(&self) -> Option<EnergyTarget> {
        self.room
            .structures
            .iter()
            .find(|s| s.kind == StructureKind::Storage && s.free_capacity() > 0)
            .map(structure_target)
    }

    /// Structures below the repair threshold, most damaged first.
    pub fn damaged(&self) -> &[&'a Structure] {
        self.damaged.get_or_init(|| {
            let room: &'a RoomState = self.room;
            let mut damaged: Vec<&'a Structure> = room
                .structures
                .iter()
                .filter(|s| s.hit_ratio() < self.config.repair_threshold)
                .collect();
            damaged.sort_by(|a, b| {
                a.hit_ratio()
                    .total_cmp(&b.hit_ratio())
                    .then_with(|| a.id.cmp(&b.id))
            });
            damaged
        })
    }

    /// Colony summary for demand calculations.
    pub fn summary(&self) -> &ColonySnapshot {
        self.summary
            .get_or_init(|| ColonySnapshot::capture(self.room, self.config.repair_threshold))
    }
}

fn structure_target(s: &Structure) -> EnergyTarget {
    EnergyTarget {
        id: s.id.clone(),
        pos: s.pos.clone(),
        amount: s.store,
        free: s.free_capacity(),
        kind: TargetKind::Structure(s.kind),
    }
}

/// Closest target to `from`, ties broken by id.
pub fn nearest<'t>(targets: &'t [EnergyTarget], from: &Position) -> Option<&'t EnergyTarget> {
    targets
        .iter()
        .min_by(|a, b| {
            a.pos
                .range_to(from)
                .cmp(&b.pos.range_to(from))
                .then_with(|| a.id.cmp(&b.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::{RoomName, Spawn};

    fn pos(x: u8, y: u8) -> Position {
        Position::new(RoomName::new("R"), x, y)
    }

    fn room() -> RoomState {
        let mut room = RoomState::new(RoomName::new("R"));
        room.spawns.push(Spawn {
            id: ObjectId::new("spawn1"),
            pos: pos(25, 25),
            store: 300,
            store_capacity: 300,
            spawning: None,
        });
        for (id, x, store) in [("ext1", 20, 0), ("ext2", 30, 50)] {
            room.structures.push(Structure {
                id: ObjectId::new(id),
                pos: pos(x, 25),
                kind: StructureKind::Extension,
                hits: 1000,
                hits_max: 1000,
                store,
                store_capacity: 50,
            });
        }
        room.structures.push(Structure {
            id: ObjectId::new("road1"),
            pos: pos(10, 10),
            kind: StructureKind::Road,
            hits: 1000,
            hits_max: 5000,
            store: 0,
            store_capacity: 0,
        });
        room.structures.push(Structure {
            id: ObjectId::new("road2"),
            pos: pos(11, 10),
            kind: StructureKind::Road,
            hits: 100,
            hits_max: 5000,
            store: 0,
            store_capacity: 0,
        });
        room
    }

    #[test]
    fn sinks_skip_full_targets() {
        let world = WorldSnapshot::new(0);
        let room = room();
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, &room, &config);

        let ids: Vec<_> = ctx.sinks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["ext1"]);
    }

    #[test]
    fn damaged_is_sorted_and_memoized() {
        let world = WorldSnapshot::new(0);
        let room = room();
        let config = OrchestratorConfig::default();
        let ctx = CycleContext::new(&world, &room, &config);

        let first = ctx.damaged().as_ptr();
        let ids: Vec<_> = ctx.damaged().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["road2", "road1"]);
        assert_eq!(first, ctx.damaged().as_ptr());
    }

    #[test]
    fn nearest_breaks_ties_by_id() {
        let targets = vec![
            EnergyTarget { id: ObjectId::new("b"), pos: pos(12, 10), amount: 0, free: 1, kind: TargetKind::Pile },
            EnergyTarget { id: ObjectId::new("a"), pos: pos(8, 10), amount: 0, free: 1, kind: TargetKind::Pile },
        ];
        assert_eq!(nearest(&targets, &pos(10, 10)).unwrap().id.as_str(), "a");
        assert!(nearest(&[], &pos(10, 10)).is_none());
    }

    #[test]
    fn summary_counts_room_state() {
        let room = room();
        let summary = ColonySnapshot::capture(&room, 0.75);
        assert_eq!(summary.damaged_structures, 2);
        assert_eq!(summary.hostiles, 0);
        assert_eq!(summary.controller_level, None);
    }
}
