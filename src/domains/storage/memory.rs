//! In-memory block storage backend.
//!
//! Keeps volumes in a process-local table. Used by the binary when no remote
//! backend is wired in, and by tests.

use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    BlockStorage, CreateVolumeOpts, StorageError, StorageResult, UpdateVolumeOpts, Volume,
};

const DEFAULT_VOLUME_TYPE: &str = "__DEFAULT__";
const STATUS_AVAILABLE: &str = "available";
const STATUS_IN_USE: &str = "in-use";

/// Volume store backed by a `RwLock`-protected vector (creation order).
#[derive(Debug, Default)]
pub struct InMemoryBlockStorage {
    volumes: RwLock<Vec<Volume>>,
}

impl InMemoryBlockStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given volumes.
    pub fn with_volumes(volumes: Vec<Volume>) -> Self {
        Self {
            volumes: RwLock::new(volumes),
        }
    }

    /// Number of stored volumes.
    pub async fn len(&self) -> usize {
        self.volumes.read().await.len()
    }

    /// Whether the store holds no volumes.
    pub async fn is_empty(&self) -> bool {
        self.volumes.read().await.is_empty()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait::async_trait]
impl BlockStorage for InMemoryBlockStorage {
    async fn list_volumes(&self) -> StorageResult<Vec<Volume>> {
        let volumes = self.volumes.read().await.clone();
        debug!(count = volumes.len(), "Listed volumes");
        Ok(volumes)
    }

    async fn get_volume(&self, volume_id: &str) -> StorageResult<Volume> {
        self.volumes
            .read()
            .await
            .iter()
            .find(|v| v.id == volume_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(volume_id))
    }

    async fn create_volume(&self, opts: CreateVolumeOpts) -> StorageResult<Volume> {
        if opts.size == 0 {
            return Err(StorageError::invalid_request("size must be at least 1 GB"));
        }

        let now = timestamp();
        let volume = Volume {
            id: Uuid::new_v4().to_string(),
            name: opts.name,
            description: opts.description.unwrap_or_default(),
            size: opts.size,
            status: STATUS_AVAILABLE.to_string(),
            volume_type: opts
                .volume_type
                .unwrap_or_else(|| DEFAULT_VOLUME_TYPE.to_string()),
            bootable: false,
            metadata: opts.metadata,
            created_at: now.clone(),
            updated_at: now,
        };

        self.volumes.write().await.push(volume.clone());
        info!(volume_id = %volume.id, name = %volume.name, size = volume.size, "Volume created");
        Ok(volume)
    }

    async fn update_volume(
        &self,
        volume_id: &str,
        opts: UpdateVolumeOpts,
    ) -> StorageResult<Volume> {
        let mut volumes = self.volumes.write().await;
        let volume = volumes
            .iter_mut()
            .find(|v| v.id == volume_id)
            .ok_or_else(|| StorageError::not_found(volume_id))?;

        if let Some(name) = opts.name {
            volume.name = name;
        }
        if let Some(description) = opts.description {
            volume.description = description;
        }
        if let Some(metadata) = opts.metadata {
            volume.metadata = metadata;
        }
        volume.updated_at = timestamp();

        info!(volume_id, "Volume updated");
        Ok(volume.clone())
    }

    async fn delete_volume(&self, volume_id: &str) -> StorageResult<()> {
        let mut volumes = self.volumes.write().await;
        let index = volumes
            .iter()
            .position(|v| v.id == volume_id)
            .ok_or_else(|| StorageError::not_found(volume_id))?;

        if volumes[index].status == STATUS_IN_USE {
            return Err(StorageError::conflict(format!(
                "volume {} is attached to an instance",
                volume_id
            )));
        }

        volumes.remove(index);
        info!(volume_id, "Volume deleted");
        Ok(())
    }
}
