//! Storage trait abstraction.

use async_trait::async_trait;
use colony_core::{Agent, ColonyId};
use serde::{Deserialize, Serialize};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// What is persisted for one colony: its agents' memories.
///
/// The task registry is deliberately absent. It is rebuilt from the
/// `task` field of each agent at cold start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonyRecord {
    /// Colony the agents belong to
    pub colony: ColonyId,

    /// Agent memories
    pub agents: Vec<Agent>,
}

/// Version marker kept beside every saved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Incremented on every save
    pub version: u64,

    /// When the record was last written
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

/// Storage abstraction for colony state that must survive a restart.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Colony operations ===

    /// Save (create or replace) a colony's agent memories.
    async fn save_colony(&mut self, record: &ColonyRecord) -> Result<()>;

    /// Load a colony's agent memories.
    async fn load_colony(&self, colony: &ColonyId) -> Result<Option<ColonyRecord>>;

    /// List all colonies with saved state.
    async fn list_colonies(&self) -> Result<Vec<ColonyId>>;

    /// Forget an abandoned colony.
    async fn delete_colony(&mut self, colony: &ColonyId) -> Result<()>;

    /// Version marker of a saved colony.
    async fn colony_meta(&self, colony: &ColonyId) -> Result<Option<RecordMeta>>;

    // === Auxiliary documents ===

    /// Save an arbitrary JSON document under a key.
    async fn save_document(&mut self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Load a document saved under a key.
    async fn load_document(&self, key: &str) -> Result<Option<serde_json::Value>>;
}
