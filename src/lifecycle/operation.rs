//! Lifecycle operation names.

use std::fmt;
use std::str::FromStr;

use crate::error::{LifecycleError, ValidationErrorKind};

/// An operation the orchestrator can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Configure,
    Start,
    Stop,
    Status,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Install,
        Operation::Configure,
        Operation::Start,
        Operation::Stop,
        Operation::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Configure => "configure",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Status => "status",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LifecycleError::Validation {
                kind: ValidationErrorKind::InvalidParameter {
                    param: "operation".to_string(),
                    message: format!("unknown operation '{}'", s),
                },
            })
    }
}
