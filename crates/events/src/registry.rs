//! Event plugin catalog.
//!
//! Plugins are registered explicitly through the builder at process start —
//! there is no runtime discovery. Building the catalog normalizes event
//! names, drops malformed definitions, and filters out plugins whose
//! dependency capability the hosting environment does not provide. The
//! filter runs once per build, not per event firing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use tagrelay_core::error::{TagError, TagResult};

use crate::plugins::{
    CartAddEvent, CartRemoveEvent, EventDefinition, EventPlugin, LoginEvent, RegistrationMode,
    SignUpEvent,
};

/// Capabilities available in the hosting environment (installed modules,
/// enabled subsystems).
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    names: BTreeSet<String>,
}

impl CapabilitySet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// What happened during a catalog build: which plugins registered, which
/// were dropped as malformed, and which were filtered by an unmet
/// dependency.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub registered: Vec<String>,
    pub dropped: Vec<(String, TagError)>,
    pub filtered: Vec<String>,
}

/// One catalog entry: normalized definition plus the plugin instance.
#[derive(Clone)]
pub struct EventEntry {
    pub definition: EventDefinition,
    pub plugin: Arc<dyn EventPlugin>,
}

/// Builder for [`EventRegistry`].
#[derive(Default)]
pub struct EventRegistryBuilder {
    plugins: Vec<Arc<dyn EventPlugin>>,
}

impl EventRegistryBuilder {
    pub fn plugin(mut self, plugin: impl EventPlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Register the built-in plugins. The sign-up plugin needs the site's
    /// registration policy to shape its configurable surface.
    pub fn with_builtins(self, registration_mode: RegistrationMode) -> Self {
        self.plugin(LoginEvent)
            .plugin(SignUpEvent::new(registration_mode))
            .plugin(CartAddEvent)
            .plugin(CartRemoveEvent)
    }

    /// Build the catalog against the given capability set.
    pub fn build(self, capabilities: &CapabilitySet) -> (EventRegistry, BuildReport) {
        let mut entries = BTreeMap::new();
        let mut report = BuildReport::default();

        for plugin in self.plugins {
            let mut definition = plugin.definition();
            if definition.id.is_empty() || definition.label.is_empty() {
                let error = TagError::InvalidEventDefinition(format!(
                    "event plugin '{}' must define both id and label",
                    definition.id
                ));
                warn!(%error, "dropping malformed event plugin definition");
                report.dropped.push((definition.id.clone(), error));
                continue;
            }
            if definition.event_name.is_empty() {
                definition.event_name = definition.id.clone();
            }
            if let Some(dependency) = &definition.dependency {
                if !capabilities.contains(dependency) {
                    report.filtered.push(definition.id.clone());
                    continue;
                }
            }
            report.registered.push(definition.id.clone());
            entries.insert(definition.id.clone(), EventEntry { definition, plugin });
        }

        info!(
            registered = report.registered.len(),
            filtered = report.filtered.len(),
            dropped = report.dropped.len(),
            "event catalog built"
        );
        (EventRegistry { entries }, report)
    }
}

/// Immutable catalog of available event plugins, sorted by plugin ID.
pub struct EventRegistry {
    entries: BTreeMap<String, EventEntry>,
}

impl EventRegistry {
    pub fn builder() -> EventRegistryBuilder {
        EventRegistryBuilder::default()
    }

    /// Catalog of the built-in plugins under the given capabilities.
    pub fn with_builtins(
        registration_mode: RegistrationMode,
        capabilities: &CapabilitySet,
    ) -> (Self, BuildReport) {
        Self::builder()
            .with_builtins(registration_mode)
            .build(capabilities)
    }

    /// Ordered mapping of plugin ID to definition.
    pub fn load(&self) -> BTreeMap<String, EventDefinition> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.definition.clone()))
            .collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EventDefinition> {
        self.entries.values().map(|entry| &entry.definition)
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.entries.contains_key(event_id)
    }

    pub fn definition(&self, event_id: &str) -> TagResult<&EventDefinition> {
        self.entries
            .get(event_id)
            .map(|entry| &entry.definition)
            .ok_or_else(|| TagError::UnknownEvent(event_id.to_string()))
    }

    pub fn plugin(&self, event_id: &str) -> TagResult<Arc<dyn EventPlugin>> {
        self.entries
            .get(event_id)
            .map(|entry| entry.plugin.clone())
            .ok_or_else(|| TagError::UnknownEvent(event_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Factory producing a fresh catalog for a capability set.
pub type CatalogBuild = Box<dyn Fn(&CapabilitySet) -> (EventRegistry, BuildReport) + Send + Sync>;

/// Process-lifetime catalog cache with copy-on-rebuild discipline.
///
/// `catalog()` hands out an `Arc` snapshot; `invalidate` builds a complete
/// replacement and swaps it in atomically, so readers never observe a
/// partially rebuilt catalog and snapshots taken earlier are unaffected.
pub struct CachedEventRegistry {
    build: CatalogBuild,
    current: RwLock<Arc<EventRegistry>>,
}

impl CachedEventRegistry {
    pub fn new(build: CatalogBuild, capabilities: &CapabilitySet) -> (Self, BuildReport) {
        let (registry, report) = build(capabilities);
        let cached = Self {
            build,
            current: RwLock::new(Arc::new(registry)),
        };
        (cached, report)
    }

    /// Cache over the built-in plugin set.
    pub fn with_builtins(
        registration_mode: RegistrationMode,
        capabilities: &CapabilitySet,
    ) -> (Self, BuildReport) {
        Self::new(
            Box::new(move |caps| EventRegistry::with_builtins(registration_mode, caps)),
            capabilities,
        )
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<EventRegistry> {
        self.current.read().clone()
    }

    /// Rebuild after the set of available capabilities changed (module
    /// install/uninstall in the hosting environment).
    pub fn invalidate(&self, capabilities: &CapabilitySet) -> BuildReport {
        let (registry, report) = (self.build)(capabilities);
        *self.current.write() = Arc::new(registry);
        info!(
            registered = report.registered.len(),
            "event catalog rebuilt"
        );
        report
    }
}
