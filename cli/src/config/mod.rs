use config::{Config, Environment, File};
use nimbus_graph::auth::AzureAdAuthConfig;
use nimbus_graph::graph_client::GraphConfig;
use serde::Deserialize;
use std::path::Path;

pub mod validation;

pub use validation::{ConfigLoadResult, ConfigValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    graph: GraphConfig,
    #[serde(default)]
    azure_ad: AzureAdAuthConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl AppConfig {
    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn azure_ad(&self) -> &AzureAdAuthConfig {
        &self.azure_ad
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

/// Loads `config.toml` (or `path`) overlaid with environment variables.
///
/// `.env` is read first. Environment keys use `__` between sections, e.g.
/// `AZURE_AD__TENANT_ID` or `GRAPH__MAX_ROWS`. A missing file is accepted
/// when it is the default one, so a configuration made only of environment
/// variables works.
pub fn load_config(path: Option<&Path>) -> ConfigLoadResult {
    dotenv::dotenv().ok();
    let env_source = Environment::default().separator("__");

    let file_source = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = match Config::builder()
        .add_source(file_source)
        .add_source(env_source)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            return ConfigLoadResult::LoadError(format!(
                "Configuration loading failed: {e}. Please check your config.toml file and environment variables."
            ));
        }
    };

    match config.try_deserialize::<AppConfig>() {
        Ok(app_config) => ConfigLoadResult::Success(Box::new(app_config)),
        Err(e) => ConfigLoadResult::DeserializeError(format!("Failed to deserialize config: {e}")),
    }
}
