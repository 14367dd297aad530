//! Update volume tool definition.

use std::collections::BTreeMap;

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::storage::{SharedStorage, UpdateVolumeOpts, Volume};
use crate::domains::tools::definition::{Mutability, ToolDefinition};
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::handlers::{ToolHandler, parse_arguments, require_non_empty, to_json};

/// Parameters for the update volume tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VolumeUpdateParams {
    /// The UUID of the volume to update.
    pub volume_id: String,

    /// New name for the volume (optional).
    #[serde(default)]
    pub name: Option<String>,

    /// New description for the volume (optional).
    #[serde(default)]
    pub description: Option<String>,

    /// Replacement key/value metadata for the volume (optional).
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Update volume tool - changes a volume's name, description or metadata.
pub struct VolumeUpdateTool {
    storage: SharedStorage,
}

impl VolumeUpdateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "volume_update";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Update a volume's metadata such as name and description. Note: Cannot change volume size or type after creation.";

    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn definition(storage: SharedStorage) -> ToolDefinition {
        ToolDefinition::for_params::<VolumeUpdateParams>(
            Self::NAME,
            Self::DESCRIPTION,
            Mutability::Mutating,
            Self::new(storage),
        )
    }

    #[instrument(skip_all, fields(volume_id = %params.volume_id))]
    pub async fn execute(&self, params: VolumeUpdateParams) -> ToolResult<Volume> {
        require_non_empty(&params.volume_id, "volume_id")?;

        let opts = UpdateVolumeOpts {
            name: params.name,
            description: params.description,
            metadata: params.metadata,
        };
        if opts.is_empty() {
            return Err(ToolError::invalid_arguments(
                "At least one of 'name', 'description' or 'metadata' must be provided",
            ));
        }

        let volume = self
            .storage
            .update_volume(&params.volume_id, opts)
            .await
            .map_err(|e| ToolError::backend("Failed to update volume", e))?;

        info!(volume_name = %volume.name, "Volume updated successfully");
        Ok(volume)
    }
}

#[async_trait::async_trait]
impl ToolHandler for VolumeUpdateTool {
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value> {
        let params: VolumeUpdateParams = parse_arguments(arguments)?;
        to_json(&self.execute(params).await?)
    }
}
