//! Configuration module.
//!
//! Two inputs: tool settings from TOML, and the broker configuration the
//! orchestrator supplies as a JSON command file for every operation.

mod service;
mod settings;

pub use service::ServiceConfig;
pub use settings::*;
