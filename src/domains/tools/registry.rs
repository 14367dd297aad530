//! Tool Registry - domain groups of tool definitions.
//!
//! Each domain (volumes today; networks or compute later) contributes one
//! [`ToolGroup`]. The registry registers every group into a single
//! dispatcher under the startup policy:
//! 1. Create the tool file in `definitions/<domain>/`
//! 2. Add it to the group's `definitions()` list
//! 3. New groups are added in `ToolRegistry::for_storage()`

use tracing::{debug, info};

use crate::domains::storage::SharedStorage;

use super::definition::{ToolDefinition, ToolPolicy};
use super::definitions::VolumeTools;
use super::dispatcher::{Dispatcher, DispatcherBuilder};
use super::error::DispatchError;

/// Counts reported by a group registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    pub skipped: usize,
}

/// An ordered collection of tool definitions from one domain.
pub trait ToolGroup: Send + Sync {
    /// Group name used in logs.
    fn name(&self) -> &'static str;

    /// Every tool the group declares, in publication order.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Register the group's tools, skipping the ones the policy forbids.
    fn register_tools(
        &self,
        builder: &mut DispatcherBuilder,
    ) -> Result<RegistrationSummary, DispatchError> {
        let policy = builder.policy();
        debug!(group = self.name(), read_only = policy.read_only, "Registering tools");

        let mut summary = RegistrationSummary::default();
        for definition in self.definitions() {
            let name = definition.name().to_string();
            let read_only = definition.is_read_only();

            if builder.register(definition)? {
                debug!(tool = %name, read_only, "Tool registered");
                summary.registered += 1;
            } else {
                debug!(tool = %name, "Skipping tool (read-only mode enabled)");
                summary.skipped += 1;
            }
        }

        info!(
            group = self.name(),
            registered = summary.registered,
            skipped = summary.skipped,
            "Tool registration complete"
        );
        Ok(summary)
    }
}

/// All tool groups served by this process.
#[derive(Default)]
pub struct ToolRegistry {
    groups: Vec<Box<dyn ToolGroup>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in group wired to the given backend.
    pub fn for_storage(storage: SharedStorage) -> Self {
        Self::new().with_group(VolumeTools::new(storage))
    }

    /// Append a group.
    pub fn with_group(mut self, group: impl ToolGroup + 'static) -> Self {
        self.groups.push(Box::new(group));
        self
    }

    /// Names of the registered groups, in order.
    pub fn group_names(&self) -> Vec<&'static str> {
        self.groups.iter().map(|g| g.name()).collect()
    }

    /// Register every group and freeze the result into a dispatcher.
    ///
    /// Fails on the first duplicate tool name; no dispatcher is produced.
    pub fn register_tools(&self, policy: ToolPolicy) -> Result<Dispatcher, DispatchError> {
        let mut builder = Dispatcher::builder(policy);
        let mut total = RegistrationSummary::default();

        for group in &self.groups {
            let summary = group.register_tools(&mut builder)?;
            total.registered += summary.registered;
            total.skipped += summary.skipped;
        }

        info!(
            groups = self.groups.len(),
            registered = total.registered,
            skipped = total.skipped,
            "Tool registry built"
        );
        Ok(builder.build())
    }
}
