//! Error types for lifecycle operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::executor::sanitize_output;

/// Main error type for lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Configuration-related errors (settings or orchestrator command file).
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors on configuration values.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// External command errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// The broker service is definitively not running.
    ///
    /// This is an observed state, not a defect.
    #[error("{label} is not running (exit code {exit_code})")]
    NotRunning { label: String, exit_code: i32 },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// Failure writing a managed file.
    #[error("Failed to write '{path}': {message}")]
    File { path: PathBuf, message: String },

    /// Failure ensuring a system user or group.
    #[error("Failed to ensure user '{name}': {message}")]
    User { name: String, message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LifecycleError {
    /// True when the error is the distinguished "not running" status outcome.
    pub fn is_not_running(&self) -> bool {
        matches!(self, LifecycleError::NotRunning { .. })
    }

    /// Short machine-readable code, used by the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::Config { .. } => "CONFIG_ERROR",
            LifecycleError::Validation { .. } => "VALIDATION_ERROR",
            LifecycleError::Command { kind } => match kind {
                CommandErrorKind::ExecutionFailed { .. } => "EXECUTION_FAILED",
                CommandErrorKind::Failed { .. } => "COMMAND_FAILED",
                CommandErrorKind::Timeout { .. } => "TIMEOUT",
            },
            LifecycleError::NotRunning { .. } => "NOT_RUNNING",
            LifecycleError::Template { .. } => "TEMPLATE_ERROR",
            LifecycleError::File { .. } => "FILE_ERROR",
            LifecycleError::User { .. } => "USER_ERROR",
            LifecycleError::Io(_) => "IO_ERROR",
            LifecycleError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Missing required parameter: {param}")]
    MissingParameter { param: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid system name for '{param}': {value}")]
    InvalidSystemName { param: String, value: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    /// The command could not be spawned or waited on.
    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    /// The command ran and returned an unexpected exit code.
    #[error("'{command}' returned {exit_code}: {}", failure_detail(.stdout, .stderr))]
    Failed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Pick the more useful stream of a failed command for its message.
fn failure_detail(stdout: &str, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        sanitize_output(stdout, 5)
    } else {
        sanitize_output(stderr, 5)
    }
}

/// Result type alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
