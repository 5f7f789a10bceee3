//! ConfigLoader facade over the config sources.

use super::sources;
use super::DataConfig;
use crate::error::ConfigError;
use std::path::Path;
use tracing::debug;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    /// Precedence: defaults (lowest) -> file, if given -> environment (highest).
    pub fn load(file: Option<&Path>) -> Result<DataConfig, ConfigError> {
        let mut builder = sources::builder_with_defaults()?;
        if let Some(path) = file {
            debug!(path = %path.display(), "Loading config file");
            builder = sources::add_file(builder, path);
        }
        let builder = sources::add_environment(builder);

        let config: DataConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> DataConfig {
        DataConfig::default()
    }
}
