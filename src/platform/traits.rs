//! Host platform trait.

use std::path::Path;

use crate::error::LifecycleResult;
use crate::executor::{CommandOutput, Invocation};

/// The host facilities lifecycle operations are built from.
///
/// Implementations run what they are asked to and report what happened;
/// they do not apply the invocation's failure policy. Callers do that with
/// [`Invocation::check`], which keeps the policy identical across the real
/// host and test doubles.
pub trait Platform {
    /// Run an external command to completion and capture its output.
    ///
    /// A non-zero exit is returned as output, not as an error. Errors are
    /// reserved for commands that could not be run at all.
    fn execute(&self, invocation: &Invocation) -> LifecycleResult<CommandOutput>;

    /// Make sure system user `name` exists and belongs to `groups`,
    /// creating whatever is missing. Succeeds when everything already exists.
    fn ensure_user(&self, name: &str, groups: &[String]) -> LifecycleResult<()>;

    /// Create or overwrite `path` with `content`, owned by `owner:group`.
    fn write_file(&self, path: &Path, content: &str, owner: &str, group: &str)
        -> LifecycleResult<()>;
}
