//! Block storage domain.
//!
//! The tools layer talks to the infrastructure backend exclusively through
//! the [`BlockStorage`] trait. The server holds a single shared handle
//! ([`SharedStorage`]) that every tool closes over, so implementations must be
//! safe for concurrent use.

mod error;
mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBlockStorage;

/// Shared, thread-safe handle to the storage backend.
pub type SharedStorage = Arc<dyn BlockStorage>;

/// A block storage volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Size in gigabytes.
    pub size: u64,
    /// Lifecycle status (creating, available, in-use, error, ...).
    pub status: String,
    pub volume_type: String,
    pub bootable: bool,
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Options for creating a volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVolumeOpts {
    pub name: String,
    /// Size in gigabytes.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Options for updating a volume. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateVolumeOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl UpdateVolumeOpts {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.metadata.is_none()
    }
}

/// Backend capability consumed by the volume tools.
///
/// Retry and backoff toward the real backend, if any, belong to the
/// implementation; callers never retry.
#[async_trait::async_trait]
pub trait BlockStorage: Send + Sync {
    /// List all volumes visible to the current project.
    async fn list_volumes(&self) -> StorageResult<Vec<Volume>>;

    /// Get a single volume by ID.
    async fn get_volume(&self, volume_id: &str) -> StorageResult<Volume>;

    /// Create a new volume.
    async fn create_volume(&self, opts: CreateVolumeOpts) -> StorageResult<Volume>;

    /// Update a volume's name, description or metadata.
    async fn update_volume(&self, volume_id: &str, opts: UpdateVolumeOpts)
    -> StorageResult<Volume>;

    /// Delete a volume by ID.
    async fn delete_volume(&self, volume_id: &str) -> StorageResult<()>;
}

/// Test doubles shared by the tool and dispatch tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Storage that fails every call with a fixed error and counts calls.
    pub struct FailingStorage {
        error: fn() -> StorageError,
        calls: AtomicUsize,
    }

    impl FailingStorage {
        pub fn new(error: fn() -> StorageError) -> Arc<Self> {
            Arc::new(Self {
                error,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail<T>(&self) -> StorageResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    #[async_trait::async_trait]
    impl BlockStorage for FailingStorage {
        async fn list_volumes(&self) -> StorageResult<Vec<Volume>> {
            self.fail()
        }

        async fn get_volume(&self, _volume_id: &str) -> StorageResult<Volume> {
            self.fail()
        }

        async fn create_volume(&self, _opts: CreateVolumeOpts) -> StorageResult<Volume> {
            self.fail()
        }

        async fn update_volume(
            &self,
            _volume_id: &str,
            _opts: UpdateVolumeOpts,
        ) -> StorageResult<Volume> {
            self.fail()
        }

        async fn delete_volume(&self, _volume_id: &str) -> StorageResult<()> {
            self.fail()
        }
    }
}
