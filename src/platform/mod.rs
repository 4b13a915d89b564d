//! Host platform module.
//!
//! The collaborators lifecycle operations drive: command execution,
//! system user management and file writes.

mod system;
mod traits;

pub use system::SystemPlatform;
pub use traits::Platform;
