//! Command executor module.
//!
//! Handles subprocess spawning, the failure policy applied to every
//! external invocation, and output sanitization for error messages.

mod invocation;
mod output;
mod subprocess;

pub use invocation::{CommandOutput, FailurePolicy, Invocation};
pub use output::sanitize_output;
pub use subprocess::SubprocessBuilder;
