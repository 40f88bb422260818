//! Execution layer - task registry, roles, tick orchestration, and the
//! workforce planner.

#![warn(missing_docs)]

pub mod actuator;
pub mod colony;
pub mod config;
pub mod context;
pub mod engine;
pub mod overseer;
pub mod planner;
pub mod registry;
pub mod roles;

pub use actuator::IntentBuffer;
pub use colony::{is_terminal, Colony, CyclePhase};
pub use config::{ConfigError, OrchestratorConfig};
pub use context::{nearest, ColonySnapshot, CycleContext, EnergyTarget, SourceSummary, TargetKind};
pub use engine::{CycleError, CycleReport, Orchestrator};
pub use overseer::{Overseer, TickReport};
pub use planner::{PlanOutcome, SpawnDecision, Verdict, WorkforcePlanner};
pub use registry::{Assignment, TaskRegistry};
pub use roles::{Role, RoleBook};
