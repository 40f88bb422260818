//! Overseer - runs every colony once per global time step.

use std::collections::BTreeMap;

use colony_core::{Actuator, Agent, ColonyId, WorldSnapshot};
use tracing::{error, info};

use crate::colony::Colony;
use crate::engine::{CycleError, CycleReport, Orchestrator};

/// Result of one global time step.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Colonies that completed their cycle
    pub reports: Vec<CycleReport>,
    /// Colonies whose cycle failed
    pub failures: Vec<(ColonyId, CycleError)>,
}

/// Owns the colonies and runs them one after the other.
///
/// Colonies share nothing; one colony failing never stops the rest.
pub struct Overseer {
    orchestrator: Orchestrator,
    colonies: BTreeMap<ColonyId, Colony>,
}

impl Overseer {
    /// Create an overseer with no colonies.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            colonies: BTreeMap::new(),
        }
    }

    /// Establish a new, empty colony. Does nothing if it already exists.
    pub fn establish(&mut self, id: ColonyId) -> &mut Colony {
        self.colonies.entry(id.clone()).or_insert_with(|| {
            info!("establishing colony {}", id);
            Colony::new(id)
        })
    }

    /// Add a colony, replacing one with the same id.
    pub fn insert(&mut self, colony: Colony) {
        self.colonies.insert(colony.id.clone(), colony);
    }

    /// Abandon a colony, returning its agents.
    pub fn abandon(&mut self, id: &ColonyId) -> Option<Vec<Agent>> {
        let colony = self.colonies.remove(id)?;
        info!("abandoning colony {}", id);
        Some(colony.abandon())
    }

    /// Look up a colony.
    pub fn colony(&self, id: &ColonyId) -> Option<&Colony> {
        self.colonies.get(id)
    }

    /// All colonies, in id order.
    pub fn colonies(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    /// Agent memories of every colony, for persisting.
    pub fn memories(&self) -> BTreeMap<ColonyId, Vec<Agent>> {
        self.colonies
            .iter()
            .map(|(id, colony)| (id.clone(), colony.memories()))
            .collect()
    }

    /// The orchestrator.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run one cycle for every colony against the same snapshot.
    pub fn run_tick(&mut self, world: &WorldSnapshot, actions: &mut dyn Actuator) -> TickReport {
        let mut tick = TickReport::default();

        for colony in self.colonies.values_mut() {
            match self.orchestrator.run_cycle(colony, world, actions) {
                Ok(report) => tick.reports.push(report),
                Err(e) => {
                    error!("colony {} failed its cycle: {}", colony.id, e);
                    tick.failures.push((colony.id.clone(), e));
                }
            }
        }

        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::roles::testing::*;
    use crate::IntentBuffer;

    #[test]
    fn establish_is_idempotent() {
        let mut overseer = Overseer::new(Orchestrator::new(OrchestratorConfig::default()));
        overseer.establish(ColonyId::new("R")).adopt(agent("a", colony_core::RoleKind::Hauler));
        overseer.establish(ColonyId::new("R"));
        assert_eq!(overseer.colonies().count(), 1);
        assert_eq!(overseer.colony(&ColonyId::new("R")).map(|c| c.agents.len()), Some(1));
    }

    #[test]
    fn abandon_hands_back_agents() {
        let mut overseer = Overseer::new(Orchestrator::new(OrchestratorConfig::default()));
        overseer.establish(ColonyId::new("R")).adopt(agent("a", colony_core::RoleKind::Hauler));

        assert_eq!(overseer.memories()[&ColonyId::new("R")].len(), 1);
        let agents = overseer.abandon(&ColonyId::new("R")).unwrap();
        assert_eq!(agents.len(), 1);
        assert!(overseer.abandon(&ColonyId::new("R")).is_none());
    }

    #[test]
    fn one_failing_colony_does_not_stop_the_others() {
        let mut overseer = Overseer::new(Orchestrator::new(OrchestratorConfig::default()));
        overseer.establish(ColonyId::new("Lost"));
        overseer.establish(ColonyId::new("R"));
        let world = world(room(), vec![]);
        let mut buf = IntentBuffer::new(&world);

        let tick = overseer.run_tick(&world, &mut buf);
        assert_eq!(tick.failures.len(), 1);
        assert_eq!(tick.failures[0].0, ColonyId::new("Lost"));
        assert_eq!(tick.reports.len(), 1);
        assert_eq!(tick.reports[0].colony, ColonyId::new("R"));
    }
}
