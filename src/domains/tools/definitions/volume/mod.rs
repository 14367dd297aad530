//! Volume tools (block storage).

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domains::storage::SharedStorage;
use crate::domains::tools::definition::ToolDefinition;
use crate::domains::tools::registry::ToolGroup;

pub use create::{VolumeCreateParams, VolumeCreateTool};
pub use delete::VolumeDeleteTool;
pub use get::VolumeGetTool;
pub use list::VolumesListTool;
pub use update::{VolumeUpdateParams, VolumeUpdateTool};

/// Parameters for tools that address a single volume.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VolumeIdParams {
    /// The UUID of the volume.
    pub volume_id: String,
}

/// The volume tool group.
pub struct VolumeTools {
    storage: SharedStorage,
}

impl VolumeTools {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

impl ToolGroup for VolumeTools {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            VolumesListTool::definition(self.storage.clone()),
            VolumeGetTool::definition(self.storage.clone()),
            VolumeCreateTool::definition(self.storage.clone()),
            VolumeUpdateTool::definition(self.storage.clone()),
            VolumeDeleteTool::definition(self.storage.clone()),
        ]
    }
}
