use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Layout directory '{0}' must be an absolute path")]
    RelativeLayoutDir(String),

    #[error("Invalid poll interval: {0} ms. Must be at least 100")]
    InvalidPollInterval(u64),

    #[error("Invalid probe timeout: {0}. Must be at least 1 second")]
    InvalidProbeTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. /etc/gantry/config.yaml (machine-wide config)
    /// 3. gantry.yaml (working-directory overrides, optional)
    /// 4. Environment variables (`GANTRY_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("/etc/gantry/config.yaml"))
            .merge(Yaml::file("gantry.yaml"))
            .merge(Env::prefixed("GANTRY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("GANTRY_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        // Installed artifacts are referenced by absolute path in units
        // and symlinks, so the layout must be absolute.
        for dir in [
            &config.layout.systemd_unit_dir,
            &config.layout.sites_available_dir,
            &config.layout.sites_enabled_dir,
            &config.layout.snippets_dir,
            &config.layout.letsencrypt_live_dir,
        ] {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLayoutDir(
                    dir.to_string_lossy().into_owned(),
                ));
            }
        }

        if config.verify.poll_interval_ms < 100 {
            return Err(ConfigError::InvalidPollInterval(config.verify.poll_interval_ms));
        }

        if config.verify.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidProbeTimeout(config.verify.probe_timeout_secs));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.layout.systemd_unit_dir, PathBuf::from("/etc/systemd/system"));
        assert!(!config.dependencies.auto_install);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
layout:
  systemd_unit_dir: /custom/units
  sites_available_dir: /custom/sites-available
dependencies:
  auto_install: true
verify:
  poll_interval_ms: 500
logging:
  level: debug
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.layout.systemd_unit_dir, PathBuf::from("/custom/units"));
        assert_eq!(
            config.layout.sites_available_dir,
            PathBuf::from("/custom/sites-available")
        );
        // Unset sections keep their defaults
        assert_eq!(config.layout.sites_enabled_dir, PathBuf::from("/etc/nginx/sites-enabled"));
        assert!(config.dependencies.auto_install);
        assert_eq!(config.verify.poll_interval_ms, 500);
        assert_eq!(config.logging.level, "debug");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_relative_layout_dir() {
        let mut config = Config::default();
        config.layout.snippets_dir = PathBuf::from("nginx/snippets");

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::RelativeLayoutDir(_)));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_poll_interval_floor() {
        let mut config = Config::default();
        config.verify.poll_interval_ms = 10;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidPollInterval(10)
        ));
    }

    #[test]
    fn test_validate_zero_probe_timeout() {
        let mut config = Config::default();
        config.verify.probe_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidProbeTimeout(0)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dependencies:\n  auto_install: true").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert!(config.dependencies.auto_install);
        // Everything else stays default
        assert_eq!(config.verify.poll_interval_ms, 2000);
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("GANTRY_DEPENDENCIES__AUTO_INSTALL", Some("true")),
                ("GANTRY_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let mut file = NamedTempFile::new().unwrap();
                writeln!(file, "logging:\n  format: pretty").unwrap();
                file.flush().unwrap();

                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert!(config.dependencies.auto_install, "env should override default");
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        // Base config
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "verify:\n  poll_interval_ms: 1000\nlogging:\n  level: warn\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        // Override config
        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.verify.poll_interval_ms, 1000);
    }
}
