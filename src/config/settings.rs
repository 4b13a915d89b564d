//! Tool settings.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LifecycleError;

/// Main settings structure.
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LimitsConfig {
    /// Kill external commands running longer than this. Unset waits forever.
    pub command_timeout_seconds: Option<u64>,
}

/// Packages installed by the install operation.
#[derive(Debug, Clone, Deserialize)]
pub struct PackagesConfig {
    #[serde(default = "default_packages")]
    pub names: Vec<String>,
}

/// Package source registered before installation.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// The apt source line.
    #[serde(default = "default_repository_line")]
    pub line: String,
    /// The sources list file the line is written to.
    #[serde(default = "default_repository_list_file")]
    pub list_file: PathBuf,
}

/// Paths of the managed files.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    /// Directory with `.tera` templates overriding the built-in ones.
    pub templates_dir: Option<PathBuf>,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_packages() -> Vec<String> {
    vec!["rabbitmq-server".to_string()]
}

fn default_repository_line() -> String {
    "deb http://dl.bintray.com/rabbitmq-erlang/debian bionic erlang".to_string()
}

fn default_repository_list_file() -> PathBuf {
    PathBuf::from("/etc/apt/sources.list.d/bintray.erlang.list")
}

fn default_env_file() -> PathBuf {
    PathBuf::from("/etc/rabbitmq/rabbitmq-env.conf")
}

fn default_config_file() -> PathBuf {
    PathBuf::from("/etc/rabbitmq/rabbitmq.config")
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/rabbitmq-lifecycle/audit.log")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            names: default_packages(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            line: default_repository_line(),
            list_file: default_repository_list_file(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            config_file: default_config_file(),
            templates_dir: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_log_path(),
        }
    }
}

impl LimitsConfig {
    /// The command timeout as a duration, if one is configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_seconds.map(Duration::from_secs)
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LifecycleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LifecycleError::Config {
            message: format!("Failed to read settings file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            LifecycleError::Config { message } => LifecycleError::Config {
                message: format!("{} (in '{}')", message, path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, LifecycleError> {
        let settings: Settings = toml::from_str(content).map_err(|e| LifecycleError::Config {
            message: format!("Failed to parse settings: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), LifecycleError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(LifecycleError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(LifecycleError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.packages.names.is_empty() {
            return Err(LifecycleError::Config {
                message: "At least one package must be configured".to_string(),
            });
        }

        if let Some(bad) = self
            .packages
            .names
            .iter()
            .find(|name| name.is_empty() || name.starts_with('-'))
        {
            return Err(LifecycleError::Config {
                message: format!("Invalid package name '{}'", bad),
            });
        }

        if self.repository.line.contains(['\n', '"', '`', '$', '\\']) {
            return Err(LifecycleError::Config {
                message: "Repository line contains forbidden characters".to_string(),
            });
        }

        for (name, path) in [
            ("paths.env_file", &self.paths.env_file),
            ("paths.config_file", &self.paths.config_file),
            ("repository.list_file", &self.repository.list_file),
        ] {
            if !path.is_absolute() {
                return Err(LifecycleError::Config {
                    message: format!("{} must be an absolute path: {}", name, path.display()),
                });
            }
        }

        if self.repository.list_file.to_string_lossy().contains('\'') {
            return Err(LifecycleError::Config {
                message: "repository.list_file must not contain quotes".to_string(),
            });
        }

        if self.limits.command_timeout_seconds == Some(0) {
            return Err(LifecycleError::Config {
                message: "limits.command_timeout_seconds must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
