//! Login event plugin.

use serde_json::json;

use tagrelay_core::types::{EventConfig, EventData, FiredEvent};

use super::{validate_text_field, ConfigField, EventDefinition, EventPlugin, FieldError};

/// Plugin ID and data-layer event name.
pub const LOGIN: &str = "login";

const DEFAULT_METHOD: &str = "CMS";

/// Signifies that a user has logged in.
pub struct LoginEvent;

impl LoginEvent {
    fn method_field() -> ConfigField {
        ConfigField {
            name: "method".into(),
            label: "Login Method".into(),
            max_length: 254,
        }
    }

    /// Canonical fired event for a completed login, using the configured
    /// method (or the plugin default when unset).
    pub fn fired(config: &EventConfig) -> FiredEvent {
        let method = config
            .get("method")
            .and_then(|value| value.as_str())
            .unwrap_or(DEFAULT_METHOD);
        let mut data = EventData::new();
        data.insert("method".into(), json!(method));
        FiredEvent::new(LOGIN, data)
    }
}

impl EventPlugin for LoginEvent {
    fn definition(&self) -> EventDefinition {
        EventDefinition::new(LOGIN, "Login")
            .with_event_name(LOGIN)
            .with_description("Send this event to signify that a user has logged in.")
            .with_dependency("user")
    }

    fn default_configuration(&self) -> EventConfig {
        let mut config = EventConfig::new();
        config.insert("method".into(), json!(DEFAULT_METHOD));
        config
    }

    fn configuration_fields(&self, _config: &EventConfig) -> Vec<ConfigField> {
        vec![Self::method_field()]
    }

    fn validate_configuration(&self, values: &EventConfig) -> Vec<FieldError> {
        validate_text_field(values, &Self::method_field())
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fired_with_default_method() {
        let event = LoginEvent::fired(&LoginEvent.default_configuration());
        assert_eq!(event.name(), "login");
        assert_eq!(event.data()["method"], "CMS");
    }

    #[test]
    fn test_fired_with_configured_method() {
        let mut config = EventConfig::new();
        config.insert("method".into(), json!("SSO"));
        let event = LoginEvent::fired(&config);
        assert_eq!(event.data()["method"], "SSO");
    }

    #[test]
    fn test_validation_is_field_scoped() {
        let mut config = EventConfig::new();
        config.insert("method".into(), json!(""));
        let errors = LoginEvent.validate_configuration(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "method");

        config.insert("method".into(), json!(42));
        let errors = LoginEvent.validate_configuration(&config);
        assert_eq!(errors[0].message, "must be a string");

        config.insert("method".into(), json!("CMS"));
        assert!(LoginEvent.validate_configuration(&config).is_empty());
    }
}
