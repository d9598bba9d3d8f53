use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_logging;
pub use settings::{
    BoxRangeParams, Config, InstanceConfig, LogFormat, LoggingConfig, RangeScalpParams, RiskLimits,
    SmaCrossParams, Strategies, SurgeParams,
};

/// Prefix for environment overrides, e.g. `RANGEBOT__INSTANCE__QUANTITY=2`.
pub const ENV_PREFIX: &str = "RANGEBOT";

/// Loads and validates the configuration for one strategy instance.
///
/// The TOML file at `path` is read first; environment variables prefixed with
/// `RANGEBOT__` override individual keys (`__` separates nesting levels).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses and validates a configuration held in memory as TOML.
pub fn config_from_toml(contents: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from_str(contents, FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(symbol = %config.instance.symbol, strategy = %config.strategy, "configuration loaded");
    Ok(config)
}
