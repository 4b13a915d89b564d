//! Error types for lifecycle operations.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
