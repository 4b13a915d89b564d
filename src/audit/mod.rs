//! Audit logging module.
//!
//! Every lifecycle operation run from the command line is recorded as one
//! JSON line: what ran, against which configuration (secrets redacted), how
//! it ended and how long it took.

mod entry;
mod logger;
mod sanitize;

pub use entry::{AuditEntry, AuditResult};
pub use logger::{AuditLog, AuditLogger, NullAuditLogger};
pub use sanitize::sanitize_params;
