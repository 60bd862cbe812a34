use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{AnalyticsConfig, Config, LogFormat, Logging};

/// The file looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `TRADELENS__ANALYTICS__RECENCY_WINDOW=30`.
pub const ENV_PREFIX: &str = "TRADELENS";

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. The file is optional;
/// any missing key falls back to its default.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE), false)
}

/// Loads configuration from `path`, layered with `TRADELENS__*` environment variables,
/// deserializes it into our strongly-typed `Config` struct and validates it.
pub fn load_config_from(path: &Path, required: bool) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(required))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.analytics.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(config.analytics, AnalyticsConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from(&dir.path().join("absent.toml"), true);
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[analytics]\nmin_group_sample = 5\nkelly_cap_pct = 10\n\n[logging]\nlevel = \"debug\"\nformat = \"compact\""
        )
        .unwrap();

        let config = load_config_from(file.path(), true).unwrap();
        assert_eq!(config.analytics.min_group_sample, 5);
        assert_eq!(config.analytics.kelly_cap_pct, dec!(10));
        assert_eq!(config.analytics.recency_window, 20);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[analytics]\nkelly_floor_pct = 30\nkelly_cap_pct = 25").unwrap();

        let result = load_config_from(file.path(), true);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
