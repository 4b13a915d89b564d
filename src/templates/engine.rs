//! Tera template engine wrapper.
//!
//! The broker's configuration templates are compiled into the binary. A
//! directory of `.tera` files can override any of them by name.

use std::path::Path;
use std::sync::Arc;

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::LifecycleError;

/// Template for `rabbitmq-env.conf`.
pub const ENV_TEMPLATE: &str = "rabbitmq/rabbitmq-env.conf.tera";

/// Template for `rabbitmq.config`.
pub const CONFIG_TEMPLATE: &str = "rabbitmq/rabbitmq.config.tera";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        ENV_TEMPLATE,
        include_str!("../../templates/rabbitmq/rabbitmq-env.conf.tera"),
    ),
    (
        CONFIG_TEMPLATE,
        include_str!("../../templates/rabbitmq/rabbitmq.config.tera"),
    ),
];

/// Template engine for rendering configuration files.
///
/// Wraps Tera and provides a simplified interface for template operations.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    /// Create an engine holding only the built-in templates.
    pub fn builtin() -> Result<Self, LifecycleError> {
        let tera = builtin_tera()?;
        debug!(count = tera.get_template_names().count(), "Built-in templates loaded");
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Create an engine whose templates in `template_dir` take precedence
    /// over the built-in ones.
    ///
    /// Templates are loaded recursively from the directory with `.tera` extension.
    pub fn with_overrides(template_dir: &Path) -> Result<Self, LifecycleError> {
        let pattern = template_dir.join("**/*.tera");
        let pattern_str = pattern.to_string_lossy();

        debug!(pattern = %pattern_str, "Loading template overrides");

        let mut tera = Tera::new(&pattern_str).map_err(|e| LifecycleError::Template {
            message: format!(
                "Failed to load templates from '{}': {}",
                template_dir.display(),
                e
            ),
        })?;
        let overridden = tera.get_template_names().count();

        // extend() keeps templates that already exist, so overrides win
        tera.extend(&builtin_tera()?)
            .map_err(|e| LifecycleError::Template {
                message: format!("Failed to merge built-in templates: {}", e),
            })?;
        tera.autoescape_on(vec![]);

        info!(
            directory = %template_dir.display(),
            overridden = overridden,
            "Template engine initialized"
        );

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template with the given context.
    ///
    /// # Arguments
    ///
    /// * `template_name` - Name of the template (e.g., "rabbitmq/rabbitmq.config.tera")
    /// * `context` - JSON value containing template variables
    pub fn render(
        &self,
        template_name: &str,
        context: &serde_json::Value,
    ) -> Result<String, LifecycleError> {
        let tera_context = Context::from_serialize(context).map_err(|e| LifecycleError::Template {
            message: format!("Invalid template context: {}", e),
        })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| LifecycleError::Template {
                message: format!("Failed to render template '{}': {}", template_name, e),
            })
    }
}

fn builtin_tera() -> Result<Tera, LifecycleError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
        .map_err(|e| LifecycleError::Template {
            message: format!("Failed to compile built-in templates: {}", e),
        })?;
    tera.autoescape_on(vec![]);
    Ok(tera)
}
