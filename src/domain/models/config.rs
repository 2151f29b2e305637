//! Tool configuration model.
//!
//! Host layout and behavior knobs that are properties of the machine,
//! not of a single deployment. Loaded by the config loader from
//! defaults, YAML files, and `GANTRY_*` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for Gantry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Host directory layout for installed artifacts
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Dependency checking behavior
    #[serde(default)]
    pub dependencies: DependencyConfig,

    /// Post-activation verification behavior
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            dependencies: DependencyConfig::default(),
            verify: VerifyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where installed artifacts land on the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LayoutConfig {
    /// Directory for process-manager unit files
    #[serde(default = "default_systemd_unit_dir")]
    pub systemd_unit_dir: PathBuf,

    /// Directory for available proxy sites
    #[serde(default = "default_sites_available_dir")]
    pub sites_available_dir: PathBuf,

    /// Directory for enabled proxy sites (symlinks)
    #[serde(default = "default_sites_enabled_dir")]
    pub sites_enabled_dir: PathBuf,

    /// Directory for shared proxy config snippets
    #[serde(default = "default_snippets_dir")]
    pub snippets_dir: PathBuf,

    /// Live certificate directory of the certificate tool
    #[serde(default = "default_letsencrypt_live_dir")]
    pub letsencrypt_live_dir: PathBuf,
}

fn default_systemd_unit_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

fn default_sites_available_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-available")
}

fn default_sites_enabled_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-enabled")
}

fn default_snippets_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/snippets")
}

fn default_letsencrypt_live_dir() -> PathBuf {
    PathBuf::from("/etc/letsencrypt/live")
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            systemd_unit_dir: default_systemd_unit_dir(),
            sites_available_dir: default_sites_available_dir(),
            sites_enabled_dir: default_sites_enabled_dir(),
            snippets_dir: default_snippets_dir(),
            letsencrypt_live_dir: default_letsencrypt_live_dir(),
        }
    }
}

impl LayoutConfig {
    /// Destination of the unit file for a service.
    pub fn unit_path(&self, service_name: &str) -> PathBuf {
        self.systemd_unit_dir.join(format!("{service_name}.service"))
    }

    /// Destination of the proxy route file for a service.
    pub fn site_path(&self, service_name: &str) -> PathBuf {
        self.sites_available_dir.join(service_name)
    }

    /// Location of the enabling symlink for a service's proxy route.
    pub fn enabled_site_path(&self, service_name: &str) -> PathBuf {
        self.sites_enabled_dir.join(service_name)
    }

    /// Destination of the frontend snippet for a service.
    pub fn frontend_snippet_path(&self, service_name: &str) -> PathBuf {
        self.snippets_dir.join(format!("{service_name}-frontend.conf"))
    }

    /// Live certificate directory for a domain.
    pub fn certificate_dir(&self, domain: &str) -> PathBuf {
        self.letsencrypt_live_dir.join(domain)
    }
}

/// Dependency checking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DependencyConfig {
    /// Install missing packages through apt instead of failing
    #[serde(default)]
    pub auto_install: bool,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self { auto_install: false }
    }
}

/// Post-activation verification behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerifyConfig {
    /// Delay between health poll attempts in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Timeout for a single HTTP probe in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

const fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = LayoutConfig::default();
        assert_eq!(
            layout.unit_path("agent-api"),
            PathBuf::from("/etc/systemd/system/agent-api.service")
        );
        assert_eq!(
            layout.site_path("agent-api"),
            PathBuf::from("/etc/nginx/sites-available/agent-api")
        );
        assert_eq!(
            layout.enabled_site_path("agent-api"),
            PathBuf::from("/etc/nginx/sites-enabled/agent-api")
        );
        assert_eq!(
            layout.frontend_snippet_path("agent-api"),
            PathBuf::from("/etc/nginx/snippets/agent-api-frontend.conf")
        );
        assert_eq!(
            layout.certificate_dir("agent.example.com"),
            PathBuf::from("/etc/letsencrypt/live/agent.example.com")
        );
    }

    #[test]
    fn test_behavior_defaults() {
        let config = Config::default();
        assert!(!config.dependencies.auto_install);
        assert_eq!(config.verify.poll_interval_ms, 2000);
        assert_eq!(config.verify.probe_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }
}
