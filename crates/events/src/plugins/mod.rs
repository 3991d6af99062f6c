//! Event plugin contract and built-in plugins.
//!
//! A plugin owns its identity, configuration defaults, configurable surface,
//! and the shaping of domain inputs into a canonical [`FiredEvent`]. Plugins
//! perform no I/O; wiring their typed constructors to domain lifecycle
//! points (login success, cart mutation) is the host's job.
//!
//! [`FiredEvent`]: tagrelay_core::types::FiredEvent

pub mod commerce;
pub mod login;
pub mod sign_up;

use tagrelay_core::types::EventConfig;

pub use commerce::{CartAddEvent, CartLine, CartRemoveEvent};
pub use login::LoginEvent;
pub use sign_up::{RegistrationMode, SignUpEvent};

/// Static identity and defaults of one event plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    /// Machine name, unique within the catalog.
    pub id: String,
    /// Name pushed to the data layer. Defaults to `id` at catalog build.
    pub event_name: String,
    pub label: String,
    pub description: String,
    /// Capability the hosting environment must provide for this plugin to be
    /// available (e.g. "user", "commerce").
    pub dependency: Option<String>,
}

impl EventDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event_name: String::new(),
            label: label.into(),
            description: String::new(),
            dependency: None,
        }
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = event_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }
}

/// Descriptor of one user-configurable field, consumed by the host form
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
    pub name: String,
    pub label: String,
    pub max_length: usize,
}

/// A field-scoped configuration error, returned as data for the host form
/// layer to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Contract shared by every event plugin.
pub trait EventPlugin: Send + Sync {
    /// Identity and defaults. The registry normalizes a missing
    /// `event_name` to the plugin ID.
    fn definition(&self) -> EventDefinition;

    /// Default configuration values.
    fn default_configuration(&self) -> EventConfig {
        EventConfig::new()
    }

    /// The user-configurable surface, given the current configuration. May
    /// be empty for plugins with nothing to configure.
    fn configuration_fields(&self, _config: &EventConfig) -> Vec<ConfigField> {
        Vec::new()
    }

    /// Validate submitted configuration values. Errors are data, not
    /// failures.
    fn validate_configuration(&self, _values: &EventConfig) -> Vec<FieldError> {
        Vec::new()
    }
}

/// Shared validation: a method-style text field must be a non-empty string
/// within the field's length bound.
pub(crate) fn validate_text_field(
    values: &EventConfig,
    field: &ConfigField,
) -> Option<FieldError> {
    match values.get(&field.name) {
        None => None,
        Some(value) => match value.as_str() {
            Some(text) if text.is_empty() => {
                Some(FieldError::new(&field.name, "must not be empty"))
            }
            Some(text) if text.len() > field.max_length => Some(FieldError::new(
                &field.name,
                format!("must be at most {} characters", field.max_length),
            )),
            Some(_) => None,
            None => Some(FieldError::new(&field.name, "must be a string")),
        },
    }
}
