//! Agent model - the persistent record of one worker unit.

use serde::{Deserialize, Serialize};

use crate::id::{AgentId, ColonyId, TaskId};

/// Role tag carried by every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Mines sources
    Harvester,
    /// Moves energy from where it lies to where it is needed
    Hauler,
    /// Feeds the controller
    Upgrader,
    /// Works construction sites
    Builder,
    /// Keeps structures in repair
    Repairer,
    /// Fights hostiles
    Defender,
}

impl RoleKind {
    /// All roles, in declaration order.
    pub const ALL: [RoleKind; 6] = [
        RoleKind::Harvester,
        RoleKind::Hauler,
        RoleKind::Upgrader,
        RoleKind::Builder,
        RoleKind::Repairer,
        RoleKind::Defender,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Harvester => "harvester",
            RoleKind::Hauler => "hauler",
            RoleKind::Upgrader => "upgrader",
            RoleKind::Builder => "builder",
            RoleKind::Repairer => "repairer",
            RoleKind::Defender => "defender",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKind::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Binary working mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Filling up (harvesting, collecting, withdrawing)
    #[default]
    Gathering,
    /// Spending what was gathered
    Working,
}

impl Mode {
    /// The other mode.
    pub fn flipped(self) -> Self {
        match self {
            Mode::Gathering => Mode::Working,
            Mode::Working => Mode::Gathering,
        }
    }
}

/// Persistent agent record.
///
/// This is the whole of what survives a cold restart for an agent. The
/// registry is rebuilt from the `task` field of every surviving record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique name
    pub name: AgentId,

    /// Role tag
    pub role: RoleKind,

    /// Gathering/working flag
    #[serde(default)]
    pub mode: Mode,

    /// Colony the agent belongs to
    pub home: ColonyId,

    /// Identity of the task currently held, if any
    #[serde(default)]
    pub task: Option<TaskId>,

    /// Spawn requested but the body has not shown up in a snapshot yet
    #[serde(skip)]
    pub pending: bool,
}

impl Agent {
    /// Create a fresh agent record.
    pub fn new(name: AgentId, role: RoleKind, home: ColonyId) -> Self {
        Self {
            name,
            role,
            mode: Mode::default(),
            home,
            task: None,
            pending: false,
        }
    }

    /// Record for an agent whose spawn was just requested.
    pub fn pending(name: AgentId, role: RoleKind, home: ColonyId) -> Self {
        Self {
            pending: true,
            ..Self::new(name, role, home)
        }
    }

    /// Flip the mode flag.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.flipped();
    }
}
