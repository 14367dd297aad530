//! Delete volume tool definition.

use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::VolumeIdParams;
use crate::domains::storage::SharedStorage;
use crate::domains::tools::definition::{Mutability, ToolDefinition};
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::handlers::{ToolHandler, parse_arguments, require_non_empty, to_json};

/// Result of a delete operation.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub success: bool,
    pub volume_id: String,
    pub message: String,
}

/// Delete volume tool - removes a volume permanently.
pub struct VolumeDeleteTool {
    storage: SharedStorage,
}

impl VolumeDeleteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "volume_delete";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Delete a volume from OpenStack. The volume must be in 'available' or 'error' state and not attached to any instance. This operation cannot be undone.";

    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn definition(storage: SharedStorage) -> ToolDefinition {
        ToolDefinition::for_params::<VolumeIdParams>(
            Self::NAME,
            Self::DESCRIPTION,
            Mutability::Mutating,
            Self::new(storage),
        )
        .destructive()
    }

    #[instrument(skip_all, fields(volume_id = %params.volume_id))]
    pub async fn execute(&self, params: &VolumeIdParams) -> ToolResult<DeleteResult> {
        require_non_empty(&params.volume_id, "volume_id")?;

        self.storage
            .delete_volume(&params.volume_id)
            .await
            .map_err(|e| ToolError::backend("Failed to delete volume", e))?;

        info!("Volume deleted successfully");
        Ok(DeleteResult {
            success: true,
            volume_id: params.volume_id.clone(),
            message: "Volume deleted successfully".to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ToolHandler for VolumeDeleteTool {
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value> {
        let params: VolumeIdParams = parse_arguments(arguments)?;
        to_json(&self.execute(&params).await?)
    }
}
