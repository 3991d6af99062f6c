//! Engine settings. Loaded from TOML config files and environment variables
//! with the prefix `TAGRELAY__`.

use serde::Deserialize;

/// Root engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Render the script snippet in its compact single-line form.
    #[serde(default = "default_true")]
    pub compact_snippet: bool,
    /// Defaults stamped onto newly built containers.
    #[serde(default)]
    pub default_container: ContainerDefaults,
}

/// Default values applied by [`Container::with_defaults`].
///
/// [`Container::with_defaults`]: crate::types::Container::with_defaults
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerDefaults {
    #[serde(default = "default_data_layer")]
    pub data_layer: String,
    #[serde(default)]
    pub include_classes: bool,
    #[serde(default)]
    pub include_environment: bool,
}

fn default_true() -> bool {
    true
}

fn default_data_layer() -> String {
    "dataLayer".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            compact_snippet: true,
            default_container: ContainerDefaults::default(),
        }
    }
}

impl Default for ContainerDefaults {
    fn default() -> Self {
        Self {
            data_layer: default_data_layer(),
            include_classes: false,
            include_environment: false,
        }
    }
}

impl EngineSettings {
    /// Load settings from an optional `tagrelay.toml` in the working
    /// directory, overridden by `TAGRELAY__`-prefixed environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("tagrelay").required(false))
            .add_source(
                config::Environment::with_prefix("TAGRELAY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
