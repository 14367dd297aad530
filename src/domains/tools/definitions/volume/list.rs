//! List volumes tool definition.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domains::storage::{SharedStorage, Volume};
use crate::domains::tools::definition::{Mutability, ToolDefinition};
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::handlers::{ToolHandler, parse_arguments, to_json};

/// Parameters for the list volumes tool (none).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct VolumesListParams {}

/// List volumes tool - returns every volume in the project.
pub struct VolumesListTool {
    storage: SharedStorage,
}

impl VolumesListTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "volumes_list";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List all volumes in the current OpenStack project. Returns an array of volume objects with details like ID, name, size, status, and creation time.";

    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn definition(storage: SharedStorage) -> ToolDefinition {
        ToolDefinition::for_params::<VolumesListParams>(
            Self::NAME,
            Self::DESCRIPTION,
            Mutability::ReadOnly,
            Self::new(storage),
        )
    }

    #[instrument(skip_all)]
    pub async fn execute(&self) -> ToolResult<Vec<Volume>> {
        let volumes = self
            .storage
            .list_volumes()
            .await
            .map_err(|e| ToolError::backend("Failed to list volumes", e))?;

        debug!(count = volumes.len(), "Volumes listed successfully");
        Ok(volumes)
    }
}

#[async_trait::async_trait]
impl ToolHandler for VolumesListTool {
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value> {
        let _params: VolumesListParams = parse_arguments(arguments)?;
        to_json(&self.execute().await?)
    }
}
