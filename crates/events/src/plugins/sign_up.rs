//! Sign-up event plugin.
//!
//! The configurable surface depends on the site's registration policy: when
//! only administrators may register, there is nothing for the host to
//! configure and the reported method is pinned to a fixed sentinel.

use serde_json::json;

use tagrelay_core::types::{EventConfig, EventData, FiredEvent};

use super::{validate_text_field, ConfigField, EventDefinition, EventPlugin, FieldError};

/// Plugin ID and data-layer event name.
pub const SIGN_UP: &str = "sign_up";

/// Method reported when registration is restricted to administrators.
pub const ADMIN_ONLY_METHOD: &str = "admin_only";

const DEFAULT_METHOD: &str = "CMS";

/// Who may register an account on the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationMode {
    #[default]
    Visitors,
    VisitorsAdminApproval,
    AdminOnly,
}

/// Indicates that a user has signed up for an account.
pub struct SignUpEvent {
    mode: RegistrationMode,
}

impl SignUpEvent {
    pub fn new(mode: RegistrationMode) -> Self {
        Self { mode }
    }

    fn method_field() -> ConfigField {
        ConfigField {
            name: "method".into(),
            label: "Signup Method".into(),
            max_length: 254,
        }
    }

    /// Canonical fired event for a completed registration.
    pub fn fired(&self, config: &EventConfig) -> FiredEvent {
        let method = if self.mode == RegistrationMode::AdminOnly {
            ADMIN_ONLY_METHOD
        } else {
            config
                .get("method")
                .and_then(|value| value.as_str())
                .unwrap_or(DEFAULT_METHOD)
        };
        let mut data = EventData::new();
        data.insert("method".into(), json!(method));
        FiredEvent::new(SIGN_UP, data)
    }
}

impl EventPlugin for SignUpEvent {
    fn definition(&self) -> EventDefinition {
        EventDefinition::new(SIGN_UP, "User registration")
            .with_event_name(SIGN_UP)
            .with_description("This event indicates that a user has signed up for an account.")
            .with_dependency("user")
    }

    fn default_configuration(&self) -> EventConfig {
        let mut config = EventConfig::new();
        if self.mode != RegistrationMode::AdminOnly {
            config.insert("method".into(), json!(DEFAULT_METHOD));
        }
        config
    }

    fn configuration_fields(&self, _config: &EventConfig) -> Vec<ConfigField> {
        if self.mode == RegistrationMode::AdminOnly {
            return Vec::new();
        }
        vec![Self::method_field()]
    }

    fn validate_configuration(&self, values: &EventConfig) -> Vec<FieldError> {
        if self.mode == RegistrationMode::AdminOnly {
            return Vec::new();
        }
        validate_text_field(values, &Self::method_field())
            .into_iter()
            .collect()
    }
}
