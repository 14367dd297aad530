//! Create volume tool definition.

use std::collections::BTreeMap;

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::storage::{CreateVolumeOpts, SharedStorage, Volume};
use crate::domains::tools::definition::{Mutability, ToolDefinition};
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::handlers::{ToolHandler, parse_arguments, require_non_empty, to_json};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the create volume tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VolumeCreateParams {
    /// Name of the volume.
    pub name: String,

    /// Size of the volume in gigabytes (GB). Must be a positive integer.
    pub size: i64,

    /// Optional description of the volume.
    #[serde(default)]
    pub description: Option<String>,

    /// Optional volume type (e.g., 'lvm', 'ssd', 'hdd'). Defaults to the configured default volume type.
    #[serde(default)]
    pub volume_type: Option<String>,

    /// Optional key/value metadata to attach to the volume.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl VolumeCreateParams {
    /// Validate and convert into backend options.
    pub fn into_opts(self) -> ToolResult<CreateVolumeOpts> {
        require_non_empty(&self.name, "name")?;
        if self.size <= 0 {
            return Err(ToolError::invalid_arguments("Size must be a positive number"));
        }

        Ok(CreateVolumeOpts {
            name: self.name,
            size: self.size.unsigned_abs(),
            description: self.description.filter(|d| !d.is_empty()),
            volume_type: self.volume_type.filter(|t| !t.is_empty()),
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Create volume tool - provisions a new block storage volume.
pub struct VolumeCreateTool {
    storage: SharedStorage,
}

impl VolumeCreateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "volume_create";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Create a new block storage volume in OpenStack. The volume will be created in the 'creating' state and transition to 'available' when ready.";

    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn definition(storage: SharedStorage) -> ToolDefinition {
        ToolDefinition::for_params::<VolumeCreateParams>(
            Self::NAME,
            Self::DESCRIPTION,
            Mutability::Mutating,
            Self::new(storage),
        )
    }

    #[instrument(skip_all, fields(name = %params.name, size = params.size))]
    pub async fn execute(&self, params: VolumeCreateParams) -> ToolResult<Volume> {
        let opts = params.into_opts()?;
        let name = opts.name.clone();

        let volume = self
            .storage
            .create_volume(opts)
            .await
            .map_err(|e| ToolError::backend("Failed to create volume", e))?;

        info!(
            volume_id = %volume.id,
            volume_name = %name,
            size = volume.size,
            "Volume created successfully"
        );
        Ok(volume)
    }
}

#[async_trait::async_trait]
impl ToolHandler for VolumeCreateTool {
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value> {
        let params: VolumeCreateParams = parse_arguments(arguments)?;
        to_json(&self.execute(params).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::storage::testing::FailingStorage;
    use crate::domains::storage::{BlockStorage, InMemoryBlockStorage, StorageError};
    use serde_json::json;
    use std::sync::Arc;

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_volume() {
        let storage = Arc::new(InMemoryBlockStorage::new());
        let tool = VolumeCreateTool::new(storage.clone());

        let value = tool
            .call(args(json!({
                "name": "scratch",
                "size": 5,
                "description": "temp space",
                "volume_type": "ssd",
                "metadata": { "team": "infra" }
            })))
            .await
            .unwrap();

        assert_eq!(value["name"], "scratch");
        assert_eq!(value["size"], 5);
        assert_eq!(value["volume_type"], "ssd");
        assert_eq!(value["metadata"]["team"], "infra");

        let stored = storage.list_volumes().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, "temp space");
    }

    #[tokio::test]
    async fn test_empty_name_never_calls_backend() {
        let storage = FailingStorage::new(|| StorageError::conflict("unreachable"));
        let tool = VolumeCreateTool::new(storage.clone());

        let err = tool
            .call(args(json!({ "name": "", "size": 5 })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid 'name' parameter");
        assert_eq!(storage.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_size_rejected() {
        let storage = FailingStorage::new(|| StorageError::conflict("unreachable"));
        let tool = VolumeCreateTool::new(storage.clone());

        for size in [0, -1] {
            let err = tool
                .call(args(json!({ "name": "disk", "size": size })))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Size must be a positive number");
        }
        assert_eq!(storage.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_use_validation_messages() {
        let storage = FailingStorage::new(|| StorageError::conflict("unreachable"));
        let tool = VolumeCreateTool::new(storage.clone());

        let err = tool.call(args(json!({ "name": "disk" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "Size must be a positive number");

        let err = tool.call(args(json!({ "name": "disk", "size": "10" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "Size must be a positive number");

        let err = tool.call(args(json!({ "size": 10 }))).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid 'name' parameter");

        assert_eq!(storage.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_wrapped() {
        let storage = FailingStorage::new(|| StorageError::Unauthorized("token expired".into()));
        let tool = VolumeCreateTool::new(storage.clone());

        let err = tool
            .call(args(json!({ "name": "disk", "size": 1 })))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to create volume: unauthorized: token expired"
        );
        assert_eq!(storage.calls(), 1);
    }

    #[test]
    fn test_schema_parameters() {
        let def = VolumeCreateTool::definition(Arc::new(InMemoryBlockStorage::new()));
        assert!(!def.is_read_only());

        let params = def.parameters();
        let required: Vec<_> = params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(required.len(), 2);
        assert!(required.contains(&"name"));
        assert!(required.contains(&"size"));

        let size = params.iter().find(|p| p.name == "size").unwrap();
        assert_eq!(size.param_type, "integer");
        assert!(size.description.as_deref().unwrap().contains("gigabytes"));
    }
}
