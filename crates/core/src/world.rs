//! Read-only world snapshot for one cycle.
//!
//! The world provider hands the scheduler one of these per cycle. Nothing in
//! it changes while a cycle runs; the effects of emitted intents show up in
//! the next snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::body::{count_parts, BodyPart, CARRY_CAPACITY};
use crate::id::{AgentId, ObjectId, RoomName};

/// A tile position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Room
    pub room: RoomName,
    /// Column, 0..50
    pub x: u8,
    /// Row, 0..50
    pub y: u8,
}

impl Position {
    /// Create a position.
    pub fn new(room: RoomName, x: u8, y: u8) -> Self {
        Self { room, x, y }
    }

    /// Chebyshev distance, or `u32::MAX` across rooms.
    pub fn range_to(&self, other: &Position) -> u32 {
        if self.room != other.room {
            return u32::MAX;
        }
        let dx = (self.x as i32 - other.x as i32).unsigned_abs();
        let dy = (self.y as i32 - other.y as i32).unsigned_abs();
        dx.max(dy)
    }

    /// Whether `other` is within `range` tiles.
    pub fn in_range(&self, other: &Position, range: u32) -> bool {
        self.range_to(other) <= range
    }

    /// One step toward `target`, diagonals allowed.
    pub fn step_toward(&self, target: &Position) -> Position {
        if self.room != target.room {
            return self.clone();
        }
        let step = |from: u8, to: u8| -> u8 {
            match from.cmp(&to) {
                std::cmp::Ordering::Less => from + 1,
                std::cmp::Ordering::Greater => from - 1,
                std::cmp::Ordering::Equal => from,
            }
        };
        Position::new(self.room.clone(), step(self.x, target.x), step(self.y, target.y))
    }
}

/// Kinds of built structure (spawns are listed separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Spawn point (only used for construction sites)
    Spawn,
    /// Extra spawn energy capacity
    Extension,
    /// Defensive tower
    Tower,
    /// Small energy buffer
    Container,
    /// Large energy buffer
    Storage,
    /// Road
    Road,
    /// Wall
    Wall,
    /// Rampart
    Rampart,
}

impl StructureKind {
    /// Whether energy delivered here feeds spawning or defense.
    pub fn is_sink(&self) -> bool {
        matches!(self, StructureKind::Extension | StructureKind::Tower)
    }

    /// Whether the structure is a general-purpose energy buffer.
    pub fn is_store(&self) -> bool {
        matches!(self, StructureKind::Container | StructureKind::Storage)
    }

    /// Build priority rank (lower first).
    pub fn build_rank(&self) -> u8 {
        match self {
            StructureKind::Spawn => 0,
            StructureKind::Extension => 1,
            StructureKind::Tower => 2,
            StructureKind::Container => 3,
            StructureKind::Storage => 4,
            StructureKind::Road => 5,
            StructureKind::Rampart => 6,
            StructureKind::Wall => 7,
        }
    }
}

/// Room controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Level, 0..=8
    pub level: u8,
    /// Upgrade progress towards the next level
    pub progress: u32,
    /// Whether the colony owns it
    pub owned: bool,
}

/// Energy source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Energy left
    pub energy: u32,
    /// Energy after regeneration
    pub capacity: u32,
    /// Walkable tiles around the source
    pub slots: u32,
}

/// Spawn point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Energy stored in the spawn itself
    pub store: u32,
    /// Capacity of the spawn's own store
    pub store_capacity: u32,
    /// Agent currently being produced
    pub spawning: Option<AgentId>,
}

impl Spawn {
    /// Whether the spawn can start a new body.
    pub fn is_idle(&self) -> bool {
        self.spawning.is_none()
    }

    /// Unused store capacity.
    pub fn free_capacity(&self) -> u32 {
        self.store_capacity.saturating_sub(self.store)
    }
}

/// A built structure other than a spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Kind
    pub kind: StructureKind,
    /// Current hit points
    pub hits: u32,
    /// Maximum hit points
    pub hits_max: u32,
    /// Energy stored (0 for structures without a store)
    pub store: u32,
    /// Store capacity (0 for structures without a store)
    pub store_capacity: u32,
}

impl Structure {
    /// Unused store capacity.
    pub fn free_capacity(&self) -> u32 {
        self.store_capacity.saturating_sub(self.store)
    }

    /// Fraction of hit points remaining.
    pub fn hit_ratio(&self) -> f64 {
        if self.hits_max == 0 {
            return 1.0;
        }
        self.hits as f64 / self.hits_max as f64
    }
}

/// A construction site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionSite {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// What will be built
    pub kind: StructureKind,
    /// Progress so far
    pub progress: u32,
    /// Progress needed
    pub progress_total: u32,
}

impl ConstructionSite {
    /// Progress still needed.
    pub fn remaining(&self) -> u32 {
        self.progress_total.saturating_sub(self.progress)
    }
}

/// Energy lying on the ground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEnergy {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Amount
    pub amount: u32,
}

/// Hostile unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostile {
    /// Object id
    pub id: ObjectId,
    /// Position
    pub pos: Position,
    /// Hit points left
    pub hits: u32,
}

/// State of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    /// Name
    pub name: RoomName,
    /// Energy on hand in spawns and extensions
    pub energy_available: u32,
    /// Total spawn and extension capacity
    pub energy_capacity: u32,
    /// Controller, if the room has one
    pub controller: Option<Controller>,
    /// Energy sources
    pub sources: Vec<Source>,
    /// Spawn points
    pub spawns: Vec<Spawn>,
    /// Built structures
    pub structures: Vec<Structure>,
    /// Construction sites
    pub sites: Vec<ConstructionSite>,
    /// Dropped energy piles
    pub dropped: Vec<DroppedEnergy>,
    /// Hostile units
    pub hostiles: Vec<Hostile>,
}

impl RoomState {
    /// Empty room.
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            energy_available: 0,
            energy_capacity: 0,
            controller: None,
            sources: Vec::new(),
            spawns: Vec::new(),
            structures: Vec::new(),
            sites: Vec::new(),
            dropped: Vec::new(),
            hostiles: Vec::new(),
        }
    }

    /// Look up a source.
    pub fn source(&self, id: &ObjectId) -> Option<&Source> {
        self.sources.iter().find(|s| &s.id == id)
    }

    /// Look up a spawn.
    pub fn spawn(&self, id: &ObjectId) -> Option<&Spawn> {
        self.spawns.iter().find(|s| &s.id == id)
    }

    /// Look up a structure.
    pub fn structure(&self, id: &ObjectId) -> Option<&Structure> {
        self.structures.iter().find(|s| &s.id == id)
    }

    /// Look up a construction site.
    pub fn site(&self, id: &ObjectId) -> Option<&ConstructionSite> {
        self.sites.iter().find(|s| &s.id == id)
    }

    /// Look up a dropped pile.
    pub fn dropped(&self, id: &ObjectId) -> Option<&DroppedEnergy> {
        self.dropped.iter().find(|d| &d.id == id)
    }

    /// Look up a hostile.
    pub fn hostile(&self, id: &ObjectId) -> Option<&Hostile> {
        self.hostiles.iter().find(|h| &h.id == id)
    }

    /// Controller if its id matches.
    pub fn controller_by_id(&self, id: &ObjectId) -> Option<&Controller> {
        self.controller.as_ref().filter(|c| &c.id == id)
    }

    /// Position of any object in the room.
    pub fn position_of(&self, id: &ObjectId) -> Option<&Position> {
        self.source(id)
            .map(|s| &s.pos)
            .or_else(|| self.spawn(id).map(|s| &s.pos))
            .or_else(|| self.structure(id).map(|s| &s.pos))
            .or_else(|| self.site(id).map(|s| &s.pos))
            .or_else(|| self.dropped(id).map(|d| &d.pos))
            .or_else(|| self.hostile(id).map(|h| &h.pos))
            .or_else(|| self.controller_by_id(id).map(|c| &c.pos))
    }

    /// Energy stored in containers and storage.
    pub fn stored_energy(&self) -> u32 {
        self.structures
            .iter()
            .filter(|s| s.kind.is_store())
            .map(|s| s.store)
            .sum()
    }
}

/// Body and position of an agent as seen this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creep {
    /// Agent name
    pub name: AgentId,
    /// Position
    pub pos: Position,
    /// Body parts
    pub body: Vec<BodyPart>,
    /// Energy carried
    pub energy: u32,
    /// Cycles left to live; `None` while still being spawned
    pub ticks_to_live: Option<u32>,
    /// Still being produced by a spawn point
    pub spawning: bool,
}

impl Creep {
    /// Total carry capacity.
    pub fn carry_capacity(&self) -> u32 {
        self.parts(BodyPart::Carry) * CARRY_CAPACITY
    }

    /// Unused carry capacity.
    pub fn free_capacity(&self) -> u32 {
        self.carry_capacity().saturating_sub(self.energy)
    }

    /// Number of parts of one kind.
    pub fn parts(&self, part: BodyPart) -> u32 {
        count_parts(&self.body, part)
    }

    /// Whether the creep carries nothing.
    pub fn is_empty(&self) -> bool {
        self.energy == 0
    }

    /// Whether the creep cannot carry more.
    pub fn is_full(&self) -> bool {
        self.free_capacity() == 0
    }
}

/// Consistent snapshot of everything visible this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Global time step
    pub time: u64,
    /// Visible rooms
    pub rooms: BTreeMap<RoomName, RoomState>,
    /// Owned agents' bodies
    pub creeps: BTreeMap<AgentId, Creep>,
}

impl WorldSnapshot {
    /// Empty snapshot at the given time.
    pub fn new(time: u64) -> Self {
        Self {
            time,
            rooms: BTreeMap::new(),
            creeps: BTreeMap::new(),
        }
    }

    /// Look up a room.
    pub fn room(&self, name: &RoomName) -> Option<&RoomState> {
        self.rooms.get(name)
    }

    /// Look up an agent's body.
    pub fn creep(&self, name: &AgentId) -> Option<&Creep> {
        self.creeps.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: u8, y: u8) -> Position {
        Position::new(RoomName::new("R"), x, y)
    }

    #[test]
    fn range_is_chebyshev() {
        assert_eq!(pos(10, 10).range_to(&pos(13, 11)), 3);
        assert_eq!(pos(10, 10).range_to(&pos(10, 10)), 0);
        let elsewhere = Position::new(RoomName::new("Q"), 10, 10);
        assert_eq!(pos(10, 10).range_to(&elsewhere), u32::MAX);
    }

    #[test]
    fn step_moves_diagonally() {
        assert_eq!(pos(10, 10).step_toward(&pos(13, 8)), pos(11, 9));
        assert_eq!(pos(10, 10).step_toward(&pos(10, 10)), pos(10, 10));
    }

    #[test]
    fn position_lookup_covers_all_objects() {
        let mut room = RoomState::new(RoomName::new("R"));
        room.sources.push(Source {
            id: ObjectId::new("s1"),
            pos: pos(5, 5),
            energy: 3000,
            capacity: 3000,
            slots: 2,
        });
        room.hostiles.push(Hostile { id: ObjectId::new("h1"), pos: pos(40, 40), hits: 100 });

        assert_eq!(room.position_of(&ObjectId::new("s1")), Some(&pos(5, 5)));
        assert_eq!(room.position_of(&ObjectId::new("h1")), Some(&pos(40, 40)));
        assert_eq!(room.position_of(&ObjectId::new("nope")), None);
    }
}
