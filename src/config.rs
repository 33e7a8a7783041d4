//! Runtime configuration.
//!
//! [`LifelineConfig::load`] reads `config/lifeline.toml` when present and
//! overlays `LIFELINE__*` environment variables, e.g.
//!
//! ```text
//! LIFELINE__DEFAULT_STRATEGY=union
//! LIFELINE__DISPATCH__PREFIXES=find,count
//! ```

use crate::entity::Strategy;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/lifeline.toml";
const ENV_PREFIX: &str = "LIFELINE";

/// Settings consumed by
/// [`DefaultEntityFactory::from_config`](crate::DefaultEntityFactory::from_config)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifelineConfig {
    /// Strategy for many-to-many relationships that declare none
    #[serde(default)]
    pub default_strategy: Strategy,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Dynamic method dispatch settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Method-name prefixes routed to relationship queries; empty disables dispatch
    #[serde(default)]
    pub prefixes: Vec<String>,
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("dispatch.prefixes")
}

impl LifelineConfig {
    /// Load from `config/lifeline.toml` (optional) and the environment
    ///
    /// An unreadable or malformed file is skipped with a warning and the
    /// environment alone is used.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, \
                             then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        settings.try_deserialize()
    }

    /// Parse TOML text
    ///
    /// ```
    /// use lifeline::{LifelineConfig, Strategy};
    ///
    /// let config = LifelineConfig::from_toml_str(
    ///     r#"
    ///     default_strategy = "union"
    ///
    ///     [dispatch]
    ///     prefixes = ["find"]
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.default_strategy, Strategy::Union);
    /// assert_eq!(config.dispatch.prefixes, vec!["find".to_string()]);
    /// ```
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
