//! Configuration file templates.

mod engine;

pub use engine::{TemplateEngine, CONFIG_TEMPLATE, ENV_TEMPLATE};
