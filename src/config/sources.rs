//! Config sources: defaults, optional file, DATASTORE__* environment.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use std::path::Path;

/// Builder seeded with the proxy defaults
pub(super) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("proxy.request_timeout_ms", 30_000i64)?
        .set_default(
            "proxy.user_agent",
            format!("datastore/{}", env!("CARGO_PKG_VERSION")),
        )
}

/// Add a TOML or JSON file; the format follows the extension
pub(super) fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path))
}

/// Add environment variable overlay to builder.
/// Uses DATASTORE prefix and __ as separator for nested keys.
pub(super) fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("DATASTORE")
            .separator("__")
            .try_parsing(true),
    )
}
