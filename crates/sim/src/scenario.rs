//! Scenario builder - sets up starting rooms for a simulation.

use colony_core::{
    ConstructionSite, Controller, DroppedEnergy, Hostile, ObjectId, Position, RoomName, RoomState,
    Source, Spawn, Structure, StructureKind, WorldSnapshot,
};

use crate::world::SimWorld;

/// Builds a world of freshly claimed rooms.
///
/// Every room gets two sources, one spawn and an owned level-1 controller.
/// Everything else is opt-in.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    rooms: Vec<RoomName>,
    time: u64,
    extensions: u32,
    sites: u32,
    hostiles: u32,
    worn_roads: u32,
    dropped: u32,
}

impl ScenarioBuilder {
    /// Start with a single room.
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            rooms: vec![RoomName::new(room)],
            time: 0,
            extensions: 0,
            sites: 0,
            hostiles: 0,
            worn_roads: 0,
            dropped: 0,
        }
    }

    /// Add another room with the same layout.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.rooms.push(RoomName::new(room));
        self
    }

    /// Start the clock somewhere other than zero.
    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Pre-built, full extensions per room.
    pub fn with_extensions(mut self, count: u32) -> Self {
        self.extensions = count;
        self
    }

    /// Extension construction sites per room.
    pub fn with_sites(mut self, count: u32) -> Self {
        self.sites = count;
        self
    }

    /// Hostiles per room.
    pub fn with_hostiles(mut self, count: u32) -> Self {
        self.hostiles = count;
        self
    }

    /// Roads at a fifth of their hits, per room.
    pub fn with_worn_roads(mut self, count: u32) -> Self {
        self.worn_roads = count;
        self
    }

    /// Energy already lying on the floor, per room.
    pub fn with_dropped(mut self, amount: u32) -> Self {
        self.dropped = amount;
        self
    }

    /// Lay out the rooms.
    pub fn build(self) -> SimWorld {
        let mut state = WorldSnapshot::new(self.time);
        for name in &self.rooms {
            state.rooms.insert(name.clone(), self.room(name));
        }
        SimWorld::new(state)
    }

    fn room(&self, name: &RoomName) -> RoomState {
        let at = |x: u8, y: u8| Position::new(name.clone(), x, y);
        let id = |kind: &str, n: u32| ObjectId::new(format!("{}-{}-{}", name, kind, n));
        let mut room = RoomState::new(name.clone());

        room.sources.push(Source {
            id: id("source", 0),
            pos: at(10, 12),
            energy: 3000,
            capacity: 3000,
            slots: 3,
        });
        room.sources.push(Source {
            id: id("source", 1),
            pos: at(40, 38),
            energy: 3000,
            capacity: 3000,
            slots: 2,
        });
        room.spawns.push(Spawn {
            id: id("spawn", 0),
            pos: at(25, 25),
            store: 300,
            store_capacity: 300,
            spawning: None,
        });
        room.controller = Some(Controller {
            id: id("controller", 0),
            pos: at(20, 40),
            level: 1,
            progress: 0,
            owned: true,
        });

        for n in 0..self.extensions {
            room.structures.push(Structure {
                id: id("extension", n),
                pos: at(20 + (n % 10) as u8, 20 + (n / 10) as u8),
                kind: StructureKind::Extension,
                hits: 1_000,
                hits_max: 1_000,
                store: 50,
                store_capacity: 50,
            });
        }
        for n in 0..self.sites {
            room.sites.push(ConstructionSite {
                id: id("site", n),
                pos: at(30 + (n % 10) as u8, 20 + (n / 10) as u8),
                kind: StructureKind::Extension,
                progress: 0,
                progress_total: 3000,
            });
        }
        for n in 0..self.worn_roads {
            room.structures.push(Structure {
                id: id("road", n),
                pos: at(12 + (n % 30) as u8, 30),
                kind: StructureKind::Road,
                hits: 1_000,
                hits_max: 5_000,
                store: 0,
                store_capacity: 0,
            });
        }
        for n in 0..self.hostiles {
            room.hostiles.push(Hostile {
                id: id("hostile", n),
                pos: at(45, 5 + (n % 40) as u8),
                hits: 300,
            });
        }
        if self.dropped > 0 {
            room.dropped.push(DroppedEnergy {
                id: id("pile", 0),
                pos: at(12, 14),
                amount: self.dropped,
            });
        }

        room
    }
}
