//! Orchestrator configuration.
//!
//! Every number here is a tuning input, not a correctness property.

use std::path::Path;

use colony_core::RoleKind;
use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the configuration file
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Could not parse the configuration document
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range or inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the tick orchestrator and workforce planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Revalidate held tasks every N cycles
    pub revalidate_interval: u64,
    /// Run the workforce planner every N cycles
    pub spawn_interval: u64,
    /// Below this much energy on hand the planner does nothing
    pub min_spawn_energy: u32,
    /// Extra cycles added to replacement cost when judging end of life
    pub end_of_life_margin: u32,
    /// Strict spawn priority, highest first; must list every role once
    pub priority: Vec<RoleKind>,
    /// Roles that may spawn from on-hand energy when both are absent
    pub critical: [RoleKind; 2],
    /// Structures below this hit ratio need repair
    pub repair_threshold: f64,
    /// Cap on haulers
    pub max_haulers: u32,
    /// Cap on upgraders
    pub max_upgraders: u32,
    /// Cap on builders
    pub max_builders: u32,
    /// Cap on repairers
    pub max_repairers: u32,
    /// Cap on defenders
    pub max_defenders: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            revalidate_interval: 10,
            spawn_interval: 5,
            min_spawn_energy: 200,
            end_of_life_margin: 20,
            priority: vec![
                RoleKind::Harvester,
                RoleKind::Hauler,
                RoleKind::Defender,
                RoleKind::Builder,
                RoleKind::Repairer,
                RoleKind::Upgrader,
            ],
            critical: [RoleKind::Harvester, RoleKind::Hauler],
            repair_threshold: 0.75,
            max_haulers: 4,
            max_upgraders: 3,
            max_builders: 3,
            max_repairers: 2,
            max_defenders: 3,
        }
    }
}

impl OrchestratorConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check intervals and the priority list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.revalidate_interval == 0 {
            return Err(ConfigError::Invalid("revalidate_interval must be > 0".into()));
        }
        if self.spawn_interval == 0 {
            return Err(ConfigError::Invalid("spawn_interval must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.repair_threshold) {
            return Err(ConfigError::Invalid("repair_threshold must be within 0..=1".into()));
        }

        for role in RoleKind::ALL {
            let occurrences = self.priority.iter().filter(|r| **r == role).count();
            if occurrences != 1 {
                return Err(ConfigError::Invalid(format!(
                    "priority must list {} exactly once (found {})",
                    role, occurrences
                )));
            }
        }

        if self.critical[0] == self.critical[1] {
            return Err(ConfigError::Invalid("critical roles must differ".into()));
        }

        Ok(())
    }

    /// Whether `role` is one of the two bootstrap roles.
    pub fn is_critical(&self, role: RoleKind) -> bool {
        self.critical.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        OrchestratorConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = OrchestratorConfig::from_json_str(r#"{"spawn_interval": 3}"#).unwrap();
        assert_eq!(config.spawn_interval, 3);
        assert_eq!(config.revalidate_interval, 10);
        assert_eq!(config.priority[0], RoleKind::Harvester);
    }

    #[test]
    fn rejects_zero_interval() {
        let err = OrchestratorConfig::from_json_str(r#"{"revalidate_interval": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_incomplete_priority() {
        let err = OrchestratorConfig::from_json_str(r#"{"priority": ["harvester", "hauler"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("exactly once"));
    }

    #[test]
    fn rejects_duplicate_critical() {
        let mut config = OrchestratorConfig::default();
        config.critical = [RoleKind::Hauler, RoleKind::Hauler];
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colony.json");
        std::fs::write(&path, r#"{"min_spawn_energy": 300}"#).unwrap();

        assert_eq!(OrchestratorConfig::load(&path).unwrap().min_spawn_energy, 300);
        assert!(matches!(
            OrchestratorConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            OrchestratorConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
