use crate::store::RetentionPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Prefix of environment variables overriding settings, e.g. `EXCHANGE_STORE__STORE__MAX_EXCHANGES`
pub const ENV_PREFIX: &str = "EXCHANGE_STORE";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub environment: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Oldest exchanges are evicted beyond this many; 0 keeps everything
    pub max_exchanges: usize,
}

impl StoreSettings {
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::from_max_exchanges(self.max_exchanges)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self::defaults(&environment)?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a single configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::defaults("development")?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("application.environment", environment)?
            .set_default("store.max_exchanges", 0)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")
    }
}
