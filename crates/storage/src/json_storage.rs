//! JSON file storage implementation.
//!
//! Stores one JSON file per colony in a data directory and keeps a small
//! per-object meta marker (version + saved_at) beside it.

use std::path::{Path, PathBuf};

use colony_core::ColonyId;
use tokio::fs;
use tracing::debug;

use super::{ColonyRecord, RecordMeta, Result, Storage, StorageError};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Open storage rooted at `root`, creating the directory layout if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("colonies")).await?;
        fs::create_dir_all(root.join("documents")).await?;
        fs::create_dir_all(root.join("meta").join("colonies")).await?;

        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn colony_path(&self, id: &ColonyId) -> PathBuf {
        self.root.join("colonies").join(format!("{}.json", id))
    }

    fn document_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(StorageError::Other(format!("invalid document key: {:?}", key)));
        }
        Ok(self.root.join("documents").join(format!("{}.json", key)))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let version = match read_json::<RecordMeta>(&path).await {
            Ok(Some(meta)) => meta.version + 1,
            // A missing or unreadable marker restarts the count
            _ => 1,
        };
        let meta = RecordMeta {
            version,
            saved_at: chrono::Utc::now(),
        };
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_colony(&mut self, record: &ColonyRecord) -> Result<()> {
        let path = self.colony_path(&record.colony);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json.as_bytes()).await?;

        let version = self.bump_version("colonies", record.colony.as_str()).await?;
        debug!(
            "Saved colony {} ({} agents, version {})",
            record.colony,
            record.agents.len(),
            version
        );
        Ok(())
    }

    async fn load_colony(&self, colony: &ColonyId) -> Result<Option<ColonyRecord>> {
        read_json(&self.colony_path(colony)).await
    }

    async fn list_colonies(&self) -> Result<Vec<ColonyId>> {
        let records: Vec<ColonyRecord> = list_dir(&self.root.join("colonies")).await?;
        let mut ids: Vec<_> = records.into_iter().map(|r| r.colony).collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete_colony(&mut self, colony: &ColonyId) -> Result<()> {
        remove_if_exists(&self.colony_path(colony)).await?;
        remove_if_exists(&self.meta_path("colonies", colony.as_str())).await?;
        Ok(())
    }

    async fn colony_meta(&self, colony: &ColonyId) -> Result<Option<RecordMeta>> {
        read_json(&self.meta_path("colonies", colony.as_str())).await
    }

    async fn save_document(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        let path = self.document_path(key)?;
        fs::write(&path, serde_json::to_string_pretty(value)?.as_bytes()).await?;
        Ok(())
    }

    async fn load_document(&self, key: &str) -> Result<Option<serde_json::Value>> {
        read_json(&self.document_path(key)?).await
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}
