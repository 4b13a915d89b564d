//! Audit logger for writing audit entries to file.
//!
//! Writes structured audit entries as JSON lines (one JSON object per line).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::LifecycleError;

use super::entry::AuditEntry;

/// Destination for audit entries.
pub trait AuditLog {
    /// Record one entry.
    fn log(&self, entry: &AuditEntry) -> Result<(), LifecycleError>;
}

/// Appends audit entries to a file in JSON lines format.
pub struct AuditLogger {
    file: File,
}

impl AuditLogger {
    /// Create a new audit logger that appends to `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn new(path: &Path) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!(path = %parent.display(), "Creating audit log directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        debug!(path = %path.display(), "Audit logger initialized");

        Ok(Self { file })
    }
}

impl AuditLog for AuditLogger {
    fn log(&self, entry: &AuditEntry) -> Result<(), LifecycleError> {
        let json = serde_json::to_string(entry)?;

        let mut file = &self.file;
        writeln!(file, "{}", json)?;

        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync audit log");
        }

        debug!(
            operation_id = %entry.operation_id,
            operation = %entry.operation,
            "Audit entry logged"
        );

        Ok(())
    }
}

/// A no-op audit logger for when audit logging is disabled.
#[derive(Default)]
pub struct NullAuditLogger;

impl AuditLog for NullAuditLogger {
    fn log(&self, _entry: &AuditEntry) -> Result<(), LifecycleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_entry(operation: &str) -> AuditEntry {
        AuditEntry::from_outcome(
            "2024-01-15T10:30:45.123Z".to_string(),
            Uuid::nil(),
            "rabbitmq",
            operation,
            serde_json::json!({}),
            &Ok(()),
            10,
        )
    }

    #[test]
    fn test_logger_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("subdir/audit.log");

        AuditLogger::new(&log_path).unwrap();
        assert!(log_path.parent().unwrap().exists());
        assert!(log_path.exists());
    }

    #[test]
    fn test_logger_appends_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");

        {
            let logger = AuditLogger::new(&log_path).unwrap();
            logger.log(&create_test_entry("install")).unwrap();
        }
        {
            let logger = AuditLogger::new(&log_path).unwrap();
            logger.log(&create_test_entry("status")).unwrap();
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["operation"], "install");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["operation"], "status");
        assert_eq!(second["result"]["status"], "success");
        assert_eq!(second["service"], "rabbitmq");
    }

    #[test]
    fn test_null_logger() {
        assert!(NullAuditLogger.log(&create_test_entry("stop")).is_ok());
    }
}
