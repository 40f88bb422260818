//! Intent buffer - the snapshot-backed [`Actuator`].
//!
//! Every request is checked against the cycle's snapshot and answered with an
//! outcome code. Accepted requests are recorded as [`Intent`]s for the world
//! to carry out after the cycle. An agent gets one action and one move per
//! cycle; a spawn point gets one spawn.

use std::collections::{BTreeMap, HashSet};

use colony_core::{
    body_cost, ActionOutcome, Actuator, AgentId, BodyPart, Creep, Intent, ObjectId, Position,
    RoomName, RoomState, SpawnOutcome, WorldSnapshot, MAX_BODY_PARTS,
};
use tracing::trace;

/// Range for harvest, transfer, withdraw, pickup, attack, recycle.
const TOUCH_RANGE: u32 = 1;

/// Range for build, repair, upgrade.
const WORK_RANGE: u32 = 3;

/// Records intents after checking them against a snapshot.
pub struct IntentBuffer<'w> {
    world: &'w WorldSnapshot,
    intents: Vec<Intent>,
    acted: HashSet<AgentId>,
    moved: HashSet<AgentId>,
    busy_spawns: HashSet<ObjectId>,
    spawned_names: HashSet<AgentId>,
    spent: BTreeMap<RoomName, u32>,
    max_agents: Option<usize>,
}

impl<'w> IntentBuffer<'w> {
    /// Create an empty buffer for one snapshot.
    pub fn new(world: &'w WorldSnapshot) -> Self {
        Self {
            world,
            intents: Vec::new(),
            acted: HashSet::new(),
            moved: HashSet::new(),
            busy_spawns: HashSet::new(),
            spawned_names: HashSet::new(),
            spent: BTreeMap::new(),
            max_agents: None,
        }
    }

    /// Refuse spawns once this many agents exist.
    pub fn with_agent_cap(mut self, cap: usize) -> Self {
        self.max_agents = Some(cap);
        self
    }

    /// Intents recorded so far.
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Take the recorded intents.
    pub fn into_intents(self) -> Vec<Intent> {
        self.intents
    }

    fn body(&self, agent: &AgentId) -> Result<(&'w Creep, &'w RoomState), ActionOutcome> {
        let creep = self.world.creep(agent).ok_or(ActionOutcome::NotOwner)?;
        if creep.spawning {
            return Err(ActionOutcome::Busy);
        }
        let room = self.world.room(&creep.pos.room).ok_or(ActionOutcome::InvalidTarget)?;
        Ok((creep, room))
    }

    fn commit(&mut self, agent: &AgentId, checked: Result<Intent, ActionOutcome>) -> ActionOutcome {
        let intent = match checked {
            Ok(intent) => intent,
            Err(outcome) => return outcome,
        };
        if !self.acted.insert(agent.clone()) {
            return ActionOutcome::Busy;
        }
        trace!("intent {:?}", intent);
        self.intents.push(intent);
        ActionOutcome::Ok
    }
}

fn check_range(creep: &Creep, target: &Position, range: u32) -> Result<(), ActionOutcome> {
    if creep.pos.in_range(target, range) {
        Ok(())
    } else {
        Err(ActionOutcome::NotInRange)
    }
}

fn check_part(creep: &Creep, part: BodyPart) -> Result<(), ActionOutcome> {
    if creep.parts(part) > 0 {
        Ok(())
    } else {
        Err(ActionOutcome::NoBodyPart)
    }
}

fn check_carrying(creep: &Creep) -> Result<(), ActionOutcome> {
    if creep.is_empty() {
        Err(ActionOutcome::NotEnoughResources)
    } else {
        Ok(())
    }
}

fn check_room_for_more(creep: &Creep) -> Result<(), ActionOutcome> {
    if creep.is_full() {
        Err(ActionOutcome::Full)
    } else {
        Ok(())
    }
}

impl Actuator for IntentBuffer<'_> {
    fn move_to(&mut self, agent: &AgentId, to: &Position, range: u32) -> ActionOutcome {
        let (creep, _) = match self.body(agent) {
            Ok(found) => found,
            Err(outcome) => return outcome,
        };
        if creep.pos.in_range(to, range) {
            return ActionOutcome::Ok;
        }
        if creep.parts(BodyPart::Move) == 0 {
            return ActionOutcome::NoBodyPart;
        }
        if !self.moved.insert(agent.clone()) {
            return ActionOutcome::Busy;
        }
        self.intents.push(Intent::Move { agent: agent.clone(), to: to.clone() });
        ActionOutcome::Ok
    }

    fn harvest(&mut self, agent: &AgentId, source: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let target = room.source(source).ok_or(ActionOutcome::InvalidTarget)?;
            check_part(creep, BodyPart::Work)?;
            check_range(creep, &target.pos, TOUCH_RANGE)?;
            if target.energy == 0 {
                return Err(ActionOutcome::NotEnoughResources);
            }
            Ok(Intent::Harvest { agent: agent.clone(), source: source.clone() })
        })();
        self.commit(agent, checked)
    }

    fn pickup(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let pile = room.dropped(target).ok_or(ActionOutcome::InvalidTarget)?;
            check_range(creep, &pile.pos, TOUCH_RANGE)?;
            check_room_for_more(creep)?;
            Ok(Intent::Pickup { agent: agent.clone(), target: target.clone() })
        })();
        self.commit(agent, checked)
    }

    fn withdraw(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let store = room
                .structure(target)
                .filter(|s| s.kind.is_store())
                .ok_or(ActionOutcome::InvalidTarget)?;
            check_range(creep, &store.pos, TOUCH_RANGE)?;
            if store.store == 0 {
                return Err(ActionOutcome::NotEnoughResources);
            }
            check_room_for_more(creep)?;
            Ok(Intent::Withdraw { agent: agent.clone(), target: target.clone() })
        })();
        self.commit(agent, checked)
    }

    fn transfer(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let (pos, free) = if let Some(spawn) = room.spawn(target) {
                (&spawn.pos, spawn.free_capacity())
            } else {
                let s = room
                    .structure(target)
                    .filter(|s| s.store_capacity > 0)
                    .ok_or(ActionOutcome::InvalidTarget)?;
                (&s.pos, s.free_capacity())
            };
            check_range(creep, pos, TOUCH_RANGE)?;
            check_carrying(creep)?;
            if free == 0 {
                return Err(ActionOutcome::Full);
            }
            Ok(Intent::Transfer { agent: agent.clone(), target: target.clone() })
        })();
        self.commit(agent, checked)
    }

    fn drop_energy(&mut self, agent: &AgentId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, _) = self.body(agent)?;
            check_carrying(creep)?;
            Ok(Intent::Drop { agent: agent.clone() })
        })();
        self.commit(agent, checked)
    }

    fn build(&mut self, agent: &AgentId, site: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let target = room.site(site).ok_or(ActionOutcome::InvalidTarget)?;
            check_part(creep, BodyPart::Work)?;
            check_range(creep, &target.pos, WORK_RANGE)?;
            check_carrying(creep)?;
            Ok(Intent::Build { agent: agent.clone(), site: site.clone() })
        })();
        self.commit(agent, checked)
    }

    fn repair(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let structure = room.structure(target).ok_or(ActionOutcome::InvalidTarget)?;
            check_part(creep, BodyPart::Work)?;
            check_range(creep, &structure.pos, WORK_RANGE)?;
            check_carrying(creep)?;
            Ok(Intent::Repair { agent: agent.clone(), target: target.clone() })
        })();
        self.commit(agent, checked)
    }

    fn upgrade(&mut self, agent: &AgentId, controller: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let target = room.controller_by_id(controller).ok_or(ActionOutcome::InvalidTarget)?;
            if !target.owned {
                return Err(ActionOutcome::NotOwner);
            }
            check_part(creep, BodyPart::Work)?;
            check_range(creep, &target.pos, WORK_RANGE)?;
            check_carrying(creep)?;
            Ok(Intent::Upgrade { agent: agent.clone(), controller: controller.clone() })
        })();
        self.commit(agent, checked)
    }

    fn attack(&mut self, agent: &AgentId, target: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let hostile = room.hostile(target).ok_or(ActionOutcome::InvalidTarget)?;
            check_part(creep, BodyPart::Attack)?;
            check_range(creep, &hostile.pos, TOUCH_RANGE)?;
            Ok(Intent::Attack { agent: agent.clone(), target: target.clone() })
        })();
        self.commit(agent, checked)
    }

    fn recycle(&mut self, agent: &AgentId, spawn: &ObjectId) -> ActionOutcome {
        let checked = (|| -> Result<Intent, ActionOutcome> {
            let (creep, room) = self.body(agent)?;
            let point = room.spawn(spawn).ok_or(ActionOutcome::InvalidTarget)?;
            check_range(creep, &point.pos, TOUCH_RANGE)?;
            Ok(Intent::Recycle { agent: agent.clone(), spawn: spawn.clone() })
        })();
        self.commit(agent, checked)
    }

    fn energy_available(&self, room: &RoomName) -> u32 {
        let on_hand = self.world.room(room).map(|r| r.energy_available).unwrap_or(0);
        on_hand.saturating_sub(self.spent.get(room).copied().unwrap_or(0))
    }

    fn energy_capacity(&self, room: &RoomName) -> u32 {
        self.world.room(room).map(|r| r.energy_capacity).unwrap_or(0)
    }

    fn spawn(&mut self, spawn: &ObjectId, name: &AgentId, body: &[BodyPart]) -> SpawnOutcome {
        let Some(room) = self.world.rooms.values().find(|r| r.spawn(spawn).is_some()) else {
            return SpawnOutcome::Unavailable;
        };
        let point_busy = room.spawn(spawn).map(|s| !s.is_idle()).unwrap_or(true);
        if point_busy || self.busy_spawns.contains(spawn) {
            return SpawnOutcome::Unavailable;
        }
        if body.is_empty()
            || self.world.creeps.contains_key(name)
            || self.spawned_names.contains(name)
        {
            return SpawnOutcome::InvalidRequest;
        }
        if body.len() > MAX_BODY_PARTS {
            return SpawnOutcome::AtCapacityLimit;
        }
        if let Some(cap) = self.max_agents {
            if self.world.creeps.len() + self.spawned_names.len() >= cap {
                return SpawnOutcome::AtCapacityLimit;
            }
        }

        let cost = body_cost(body);
        if cost > self.energy_available(&room.name) {
            return SpawnOutcome::NotEnoughEnergy;
        }

        *self.spent.entry(room.name.clone()).or_default() += cost;
        self.busy_spawns.insert(spawn.clone());
        self.spawned_names.insert(name.clone());
        self.intents.push(Intent::Spawn {
            spawn: spawn.clone(),
            name: name.clone(),
            body: body.to_vec(),
        });
        SpawnOutcome::Ok
    }
}
