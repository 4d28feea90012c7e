//! Layered settings loading.
//!
//! Sources, lowest priority first:
//! 1. crate defaults,
//! 2. an optional TOML file named by `SYNDIC_CONFIG_FILE`,
//! 3. `SYNDIC__*` environment variables (e.g. `SYNDIC__API__BASE_URL`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable naming a specific configuration file
const CONFIG_FILE_ENV: &str = "SYNDIC_CONFIG_FILE";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "SYNDIC";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Loads [`Settings`] from the environment and an optional file.
pub fn load() -> Result<Settings, ConfigError> {
    let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
    load_with(config_file.as_deref())
}

/// Loads [`Settings`] with an explicit optional file path.
pub fn load_with(config_file: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::ReadError(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(true),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::ReadError(e.to_string()))?;

    let settings: Settings = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("failed to deserialize settings: {e}")))?;

    settings.validate()?;

    Ok(settings)
}
