//! Statically constructed catalog of condition plugins.
//!
//! Plugins are registered through the builder at process start; collaborators
//! may append catalog alteration hooks that run once, in registration order,
//! when the catalog is frozen. After `build()` the registry is immutable and
//! safe to share across requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use tagrelay_core::error::{TagError, TagResult};
use tagrelay_core::types::{ConditionConfig, RequestContext};

use crate::plugins::{
    Condition, CustomCondition, PathCondition, RoleCondition, StatusCondition, REQUEST_PATH,
    RESPONSE_STATUS, USER_ROLE,
};

/// Identifying metadata for one condition plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDescriptor {
    pub id: String,
    pub label: String,
}

impl ConditionDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Factory producing a configured condition instance.
pub type ConditionFactory = Arc<dyn Fn(&ConditionConfig) -> Box<dyn Condition> + Send + Sync>;

/// One catalog entry: descriptor plus instance factory.
#[derive(Clone)]
pub struct ConditionEntry {
    pub descriptor: ConditionDescriptor,
    pub factory: ConditionFactory,
}

/// Hook that may add, remove, or replace catalog entries before the catalog
/// is frozen.
pub type CatalogAlterHook = Box<dyn FnOnce(&mut BTreeMap<String, ConditionEntry>) + Send>;

/// Builder for [`ConditionRegistry`].
#[derive(Default)]
pub struct ConditionRegistryBuilder {
    entries: BTreeMap<String, ConditionEntry>,
    alters: Vec<CatalogAlterHook>,
}

impl ConditionRegistryBuilder {
    /// Register a condition plugin.
    pub fn register(mut self, descriptor: ConditionDescriptor, factory: ConditionFactory) -> Self {
        self.entries.insert(
            descriptor.id.clone(),
            ConditionEntry {
                descriptor,
                factory,
            },
        );
        self
    }

    /// Register the built-in path, role, and status conditions.
    pub fn with_builtins(self) -> Self {
        self.register(
            ConditionDescriptor::new(REQUEST_PATH, "Request path"),
            Arc::new(|config: &ConditionConfig| {
                Box::new(PathCondition::new(&config.list)) as Box<dyn Condition>
            }),
        )
        .register(
            ConditionDescriptor::new(USER_ROLE, "User role"),
            Arc::new(|config: &ConditionConfig| {
                Box::new(RoleCondition::new(&config.list)) as Box<dyn Condition>
            }),
        )
        .register(
            ConditionDescriptor::new(RESPONSE_STATUS, "Response status"),
            Arc::new(|config: &ConditionConfig| {
                Box::new(StatusCondition::new(&config.list)) as Box<dyn Condition>
            }),
        )
    }

    /// Register a host-defined predicate as a condition plugin.
    pub fn register_custom<F>(self, id: &str, label: &str, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<dyn Fn(&RequestContext) -> bool + Send + Sync> = Arc::new(predicate);
        self.register(
            ConditionDescriptor::new(id, label),
            Arc::new(move |_config: &ConditionConfig| {
                Box::new(CustomCondition::new(predicate.clone())) as Box<dyn Condition>
            }),
        )
    }

    /// Append a catalog alteration hook. Hooks are late-bound: they run once
    /// inside `build()`, in registration order, not per request.
    pub fn alter(mut self, hook: CatalogAlterHook) -> Self {
        self.alters.push(hook);
        self
    }

    /// Freeze the catalog.
    pub fn build(self) -> ConditionRegistry {
        let mut entries = self.entries;
        for alter in self.alters {
            alter(&mut entries);
        }
        debug!(count = entries.len(), "condition catalog built");
        ConditionRegistry { entries }
    }
}

/// Immutable catalog of available condition plugins.
pub struct ConditionRegistry {
    entries: BTreeMap<String, ConditionEntry>,
}

impl ConditionRegistry {
    pub fn builder() -> ConditionRegistryBuilder {
        ConditionRegistryBuilder::default()
    }

    /// Catalog with only the built-in conditions.
    pub fn with_builtins() -> Self {
        Self::builder().with_builtins().build()
    }

    /// Descriptors of every registered plugin, sorted by ID.
    pub fn list(&self) -> Vec<ConditionDescriptor> {
        self.entries
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn contains(&self, condition_id: &str) -> bool {
        self.entries.contains_key(condition_id)
    }

    /// Instantiate a plugin for the given configuration.
    pub fn instantiate(
        &self,
        condition_id: &str,
        config: &ConditionConfig,
    ) -> TagResult<Box<dyn Condition>> {
        let entry = self
            .entries
            .get(condition_id)
            .ok_or_else(|| TagError::UnknownCondition(condition_id.to_string()))?;
        Ok((entry.factory)(config))
    }
}
