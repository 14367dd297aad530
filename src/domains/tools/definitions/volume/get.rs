//! Get volume tool definition.

use rmcp::model::JsonObject;
use serde_json::Value;
use tracing::{debug, instrument};

use super::VolumeIdParams;
use crate::domains::storage::{SharedStorage, Volume};
use crate::domains::tools::definition::{Mutability, ToolDefinition};
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::handlers::{ToolHandler, parse_arguments, require_non_empty, to_json};

/// Get volume tool - fetches one volume by ID.
pub struct VolumeGetTool {
    storage: SharedStorage,
}

impl VolumeGetTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "volume_get";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get detailed information about a specific volume by its ID. Returns volume metadata including name, size, status, type, and timestamps.";

    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn definition(storage: SharedStorage) -> ToolDefinition {
        ToolDefinition::for_params::<VolumeIdParams>(
            Self::NAME,
            Self::DESCRIPTION,
            Mutability::ReadOnly,
            Self::new(storage),
        )
    }

    #[instrument(skip_all, fields(volume_id = %params.volume_id))]
    pub async fn execute(&self, params: &VolumeIdParams) -> ToolResult<Volume> {
        require_non_empty(&params.volume_id, "volume_id")?;

        let volume = self
            .storage
            .get_volume(&params.volume_id)
            .await
            .map_err(|e| ToolError::backend("Failed to get volume", e))?;

        debug!(volume_name = %volume.name, "Volume retrieved successfully");
        Ok(volume)
    }
}

#[async_trait::async_trait]
impl ToolHandler for VolumeGetTool {
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value> {
        let params: VolumeIdParams = parse_arguments(arguments)?;
        to_json(&self.execute(&params).await?)
    }
}
