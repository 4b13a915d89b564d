//! Broker configuration supplied by the orchestrator.
//!
//! The orchestrator hands every operation a command file whose
//! `configurations` object holds one section per config type. Only the two
//! sections below are read; everything else in the file is ignored.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LifecycleError, ValidationErrorKind};

/// Maximum length for system user and group names (Linux standard).
const MAX_SYSTEM_NAME_LENGTH: usize = 32;

/// Immutable snapshot of the values the lifecycle operations need.
///
/// `Serialize` exposes the password; run the output through
/// [`crate::audit::sanitize_params`] before writing it anywhere.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Broker system user.
    pub user: String,
    /// Broker system group.
    pub group: String,
    pub node_name: String,
    pub listen_interface: String,
    pub port: u16,
    /// Management plugin listener port.
    pub management_port: u16,
    pub admin_username: String,
    pub admin_password: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("user", &self.user)
            .field("group", &self.group)
            .field("node_name", &self.node_name)
            .field("listen_interface", &self.listen_interface)
            .field("port", &self.port)
            .field("management_port", &self.management_port)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct CommandFile {
    configurations: Configurations,
}

#[derive(Deserialize)]
struct Configurations {
    #[serde(rename = "rabbitmq-env")]
    env: EnvSection,
    #[serde(rename = "rabbitmq-management-plugin")]
    management: ManagementSection,
}

#[derive(Deserialize)]
struct EnvSection {
    #[serde(default = "default_system_name")]
    rabbitmq_user: String,
    #[serde(default = "default_system_name")]
    rabbitmq_group: String,
    node_name: String,
    listen_interface: String,
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
    admin_username: String,
    admin_password: String,
}

#[derive(Deserialize)]
struct ManagementSection {
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
}

fn default_system_name() -> String {
    "rabbitmq".to_string()
}

/// Accept a port as a JSON number or a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    let value = match RawPort::deserialize(deserializer)? {
        RawPort::Number(n) => n,
        RawPort::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{}'", s)))?,
    };

    match u16::try_from(value) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(serde::de::Error::custom(format!(
            "port {} out of range 1-65535",
            value
        ))),
    }
}

impl ServiceConfig {
    /// Load the service configuration from an orchestrator command file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LifecycleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LifecycleError::Config {
            message: format!("Failed to read command file '{}': {}", path.display(), e),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate the service configuration from command JSON.
    pub fn from_json(content: &str) -> Result<Self, LifecycleError> {
        let file: CommandFile =
            serde_json::from_str(content).map_err(|e| LifecycleError::Config {
                message: format!("Invalid command file: {}", e),
            })?;

        let env = file.configurations.env;
        let config = Self {
            user: env.rabbitmq_user,
            group: env.rabbitmq_group,
            node_name: env.node_name,
            listen_interface: env.listen_interface,
            port: env.port,
            management_port: file.configurations.management.port,
            admin_username: env.admin_username,
            admin_password: env.admin_password,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate field values.
    ///
    /// Values end up in line-oriented files and in command arguments, so
    /// they must be single-line and non-empty.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        validate_system_name("rabbitmq_user", &self.user)?;
        validate_system_name("rabbitmq_group", &self.group)?;

        for (param, value) in [
            ("node_name", &self.node_name),
            ("listen_interface", &self.listen_interface),
            ("admin_username", &self.admin_username),
            ("admin_password", &self.admin_password),
        ] {
            validate_single_line(param, value)?;
        }

        if self.admin_username.starts_with('-') {
            return Err(invalid("admin_username", "must not start with '-'"));
        }

        Ok(())
    }
}

fn invalid(param: &str, message: &str) -> LifecycleError {
    LifecycleError::Validation {
        kind: ValidationErrorKind::InvalidParameter {
            param: param.to_string(),
            message: message.to_string(),
        },
    }
}

fn validate_single_line(param: &str, value: &str) -> Result<(), LifecycleError> {
    if value.is_empty() {
        return Err(LifecycleError::Validation {
            kind: ValidationErrorKind::MissingParameter {
                param: param.to_string(),
            },
        });
    }
    if value.contains(['\n', '\r', '\0']) {
        return Err(invalid(param, "must not contain line breaks or NUL"));
    }
    Ok(())
}

/// Validate a system user or group name.
///
/// Rules:
/// - Must not be empty or exceed 32 characters
/// - Must start with a lowercase letter or underscore
/// - May only contain lowercase letters, digits, underscores, and hyphens
fn validate_system_name(param: &str, name: &str) -> Result<(), LifecycleError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_SYSTEM_NAME_LENGTH
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(LifecycleError::Validation {
            kind: ValidationErrorKind::InvalidSystemName {
                param: param.to_string(),
                value: name.to_string(),
            },
        })
    }
}
