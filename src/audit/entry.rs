//! Audit entry types.

use serde::Serialize;
use uuid::Uuid;

use crate::error::LifecycleError;

/// A single audit log entry.
///
/// Records one lifecycle operation: what was asked, with which
/// (sanitized) configuration, how it ended and how long it took.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp when the operation started.
    pub timestamp: String,
    /// Unique identifier for this run.
    pub operation_id: Uuid,
    /// Service the operation acted on.
    pub service: String,
    /// The lifecycle operation.
    pub operation: String,
    /// Sanitized service configuration (secrets redacted).
    pub config: serde_json::Value,
    /// How the operation ended.
    pub result: AuditResult,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditEntry {
    /// Build an entry from the outcome of an operation.
    pub fn from_outcome(
        timestamp: String,
        operation_id: Uuid,
        service: &str,
        operation: &str,
        config: serde_json::Value,
        outcome: &Result<(), LifecycleError>,
        duration_ms: u64,
    ) -> Self {
        let result = match outcome {
            Ok(()) => AuditResult::Success,
            Err(e) if e.is_not_running() => AuditResult::NotRunning,
            Err(e) => AuditResult::Failure {
                error_code: e.code().to_string(),
                error_message: e.to_string(),
            },
        };

        Self {
            timestamp,
            operation_id,
            service: service.to_string(),
            operation: operation.to_string(),
            config,
            result,
            duration_ms,
        }
    }
}

/// Outcome of an operation for audit purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    /// A status check found the service stopped.
    NotRunning,
    Failure {
        error_code: String,
        error_message: String,
    },
}
