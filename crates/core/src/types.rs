//! Container, condition, and event data model shared across the engine.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TagError, TagResult};
use crate::settings::ContainerDefaults;

/// Accepted format for a tag-manager container ID.
static CONTAINER_ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GTM-\w{4,}$").expect("container id pattern"));

/// Accepted format for a tag-manager environment ID.
static ENVIRONMENT_ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^env-\d+$").expect("environment id pattern"));

/// Whether a condition's list is an allow-list or a deny-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionToggle {
    /// Insert only when the context matches the list.
    IncludeListed,
    /// Insert on everything except the list.
    #[default]
    ExcludeListed,
}

/// Configuration of one insertion condition attached to a container.
///
/// A config equal to [`ConditionConfig::default()`] is treated as absent and
/// never stored on a container; an explicitly configured condition with an
/// empty list is a different thing entirely (see toggle semantics on the
/// evaluator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub toggle: ConditionToggle,
    #[serde(default)]
    pub list: Vec<String>,
}

impl ConditionConfig {
    pub fn include_listed<I, S>(list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            toggle: ConditionToggle::IncludeListed,
            list: list.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude_listed<I, S>(list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            toggle: ConditionToggle::ExcludeListed,
            list: list.into_iter().map(Into::into).collect(),
        }
    }

    /// Toggle polarity: a deny-listed condition is satisfied when the
    /// context does NOT match the list.
    pub fn negated(&self) -> bool {
        self.toggle == ConditionToggle::ExcludeListed
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Insertion-ordered configuration values for one event plugin.
pub type EventConfig = serde_json::Map<String, serde_json::Value>;

/// One configured tag-manager container: external container ID, snippet
/// rendering settings, and the conditions gating its insertion.
///
/// Containers are built by the host's configuration layer and passed into the
/// evaluator/assembler as an immutable snapshot for one render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Machine name, unique within the host's container store.
    pub id: String,
    pub label: String,
    /// ID assigned by the tag manager, e.g. "GTM-ABCD12".
    pub container_id: String,
    /// Render order across containers; ties break by `id`.
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_data_layer")]
    pub data_layer: String,
    /// Emit the class allow/deny lists into the data layer declaration.
    #[serde(default)]
    pub include_classes: bool,
    #[serde(default)]
    pub allowlist_classes: Vec<String>,
    #[serde(default)]
    pub denylist_classes: Vec<String>,
    /// Emit environment query parameters on the snippet URLs.
    #[serde(default)]
    pub include_environment: bool,
    #[serde(default)]
    pub environment_id: String,
    #[serde(default)]
    pub environment_token: String,
    /// Insertion conditions by condition plugin ID.
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionConfig>,
    /// Active event plugins by event plugin ID.
    #[serde(default)]
    pub events: BTreeMap<String, EventConfig>,
}

fn default_data_layer() -> String {
    "dataLayer".to_string()
}

impl Container {
    /// Create a container with stock defaults.
    pub fn new(id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self::with_defaults(id, container_id, &ContainerDefaults::default())
    }

    /// Create a container seeded from the engine's default container settings.
    pub fn with_defaults(
        id: impl Into<String>,
        container_id: impl Into<String>,
        defaults: &ContainerDefaults,
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            container_id: container_id.into(),
            weight: 0,
            data_layer: defaults.data_layer.clone(),
            include_classes: defaults.include_classes,
            allowlist_classes: Vec::new(),
            denylist_classes: Vec::new(),
            include_environment: defaults.include_environment,
            environment_id: String::new(),
            environment_token: String::new(),
            conditions: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_environment(
        mut self,
        environment_id: impl Into<String>,
        environment_token: impl Into<String>,
    ) -> Self {
        self.include_environment = true;
        self.environment_id = environment_id.into();
        self.environment_token = environment_token.into();
        self
    }

    pub fn with_classes<A, D, S, T>(mut self, allowlist: A, denylist: D) -> Self
    where
        A: IntoIterator<Item = S>,
        D: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.include_classes = true;
        self.allowlist_classes = allowlist.into_iter().map(Into::into).collect();
        self.denylist_classes = denylist.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an insertion condition. A config equal to the plugin default is
    /// dropped from the stored set; defaults impose no restriction and the
    /// evaluator treats the condition as absent.
    pub fn set_condition(&mut self, condition_id: impl Into<String>, config: ConditionConfig) {
        let condition_id = condition_id.into();
        if config.is_default() {
            self.conditions.remove(&condition_id);
        } else {
            self.conditions.insert(condition_id, config);
        }
    }

    /// Enable an event plugin on this container with the given configuration.
    pub fn set_event(&mut self, event_id: impl Into<String>, config: EventConfig) {
        self.events.insert(event_id.into(), config);
    }

    /// Check the container's format invariants.
    pub fn validate(&self) -> TagResult<()> {
        if !CONTAINER_ID_FORMAT.is_match(&self.container_id) {
            return Err(TagError::InvalidConfiguration(format!(
                "container '{}': container_id '{}' is not of the form GTM-xxxxxx",
                self.id, self.container_id
            )));
        }
        if self.include_environment && !ENVIRONMENT_ID_FORMAT.is_match(&self.environment_id) {
            return Err(TagError::InvalidConfiguration(format!(
                "container '{}': environment_id '{}' is not of the form env-x",
                self.id, self.environment_id
            )));
        }
        Ok(())
    }
}

/// Read-only snapshot of the request/response pair under evaluation.
///
/// The host resolves path aliases before construction; `is_front` records
/// whether the request targets the site front page so path conditions can
/// honor the `<front>` pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    path: String,
    is_front: bool,
    roles: BTreeSet<String>,
    status: u16,
}

impl RequestContext {
    /// Build a context for `path` with the given response status. The path is
    /// lowercased and normalized to a leading slash.
    pub fn new(path: impl Into<String>, status: u16) -> Self {
        let mut path = path.into().to_lowercase();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            path,
            is_front: false,
            roles: BTreeSet::new(),
            status,
        }
    }

    pub fn with_front(mut self, is_front: bool) -> Self {
        self.is_front = is_front;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_front(&self) -> bool {
        self.is_front
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Stable hash of the context, used to key per-request decision memos.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.path.hash(&mut hasher);
        self.is_front.hash(&mut hasher);
        for role in &self.roles {
            role.hash(&mut hasher);
        }
        self.status.hash(&mut hasher);
        hasher.finish()
    }
}

/// Insertion-ordered event payload data.
pub type EventData = serde_json::Map<String, serde_json::Value>;

/// A named analytics event destined for the client-side data layer.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredEvent {
    name: String,
    data: EventData,
}

impl FiredEvent {
    pub fn new(name: impl Into<String>, data: EventData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_container_id_format() {
        let container = Container::new("primary", "GTM-ABCD12");
        assert!(container.validate().is_ok());

        let short = Container::new("short", "GTM-ab");
        assert!(matches!(
            short.validate(),
            Err(TagError::InvalidConfiguration(_))
        ));

        let wrong_prefix = Container::new("wrong", "XYZ-ABCD12");
        assert!(wrong_prefix.validate().is_err());
    }

    #[test]
    fn test_environment_id_checked_only_when_included() {
        let mut container = Container::new("env", "GTM-ABCD12");
        container.environment_id = "not-an-env".into();
        assert!(container.validate().is_ok());

        let container = Container::new("env", "GTM-ABCD12").with_environment("not-an-env", "tok");
        assert!(container.validate().is_err());

        let container = Container::new("env", "GTM-ABCD12").with_environment("env-3", "tok123");
        assert!(container.validate().is_ok());
    }

    #[test]
    fn test_default_condition_config_is_dropped() {
        let mut container = Container::new("primary", "GTM-ABCD12");
        container.set_condition("request_path", ConditionConfig::default());
        assert!(container.conditions.is_empty());

        // An empty include-list is NOT the default and must be kept.
        container.set_condition("request_path", ConditionConfig::include_listed::<_, String>([]));
        assert_eq!(container.conditions.len(), 1);

        // Re-setting back to the default removes the stored entry.
        container.set_condition("request_path", ConditionConfig::default());
        assert!(container.conditions.is_empty());
    }

    #[test]
    fn test_context_normalization_and_fingerprint() {
        let ctx = RequestContext::new("Node/1", 200);
        assert_eq!(ctx.path(), "/node/1");

        let same = RequestContext::new("/node/1", 200);
        assert_eq!(ctx.fingerprint(), same.fingerprint());

        let other_status = RequestContext::new("/node/1", 404);
        assert_ne!(ctx.fingerprint(), other_status.fingerprint());

        let with_roles = RequestContext::new("/node/1", 200).with_roles(["editor"]);
        assert_ne!(ctx.fingerprint(), with_roles.fingerprint());
    }

    #[test]
    fn test_fired_event_preserves_data_order() {
        let mut data = EventData::new();
        data.insert("currency".into(), json!("USD"));
        data.insert("value".into(), json!("12.00"));
        data.insert("items".into(), json!([]));

        let event = FiredEvent::new("add_to_cart", data);
        let keys: Vec<&str> = event.data().keys().map(String::as_str).collect();
        assert_eq!(keys, ["currency", "value", "items"]);
    }
}
