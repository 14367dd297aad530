//! Tool definitions module.
//!
//! One sub-module per domain group, one file per tool.

pub mod volume;

pub use volume::{
    VolumeCreateParams, VolumeCreateTool, VolumeDeleteTool, VolumeGetTool, VolumeIdParams,
    VolumeTools, VolumeUpdateParams, VolumeUpdateTool, VolumesListTool,
};
