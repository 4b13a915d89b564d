//! Service definition traits.
//!
//! Defines the interface for a manageable broker service.

use crate::config::ServiceConfig;

/// Defines a manageable service.
///
/// This trait provides the static facts the lifecycle needs about a
/// service: its init-system name, which plugin to enable on install, which
/// account to remove, and the variables its configuration templates use.
///
/// # Example
///
/// ```ignore
/// pub struct RabbitmqService;
///
/// impl ServiceDefinition for RabbitmqService {
///     fn name(&self) -> &'static str { "rabbitmq" }
///     fn display_name(&self) -> &'static str { "RabbitMQ Server" }
///     fn init_service(&self) -> &'static str { "rabbitmq-server" }
///     // ...
/// }
/// ```
pub trait ServiceDefinition: Send + Sync {
    /// Service identifier (e.g., "rabbitmq").
    fn name(&self) -> &'static str;

    /// Human-readable name, used as the label in status reports.
    fn display_name(&self) -> &'static str;

    /// Name passed to `service <name> start|stop|status`.
    fn init_service(&self) -> &'static str;

    /// Plugins enabled once at install time.
    fn install_plugins(&self) -> Vec<&'static str>;

    /// Default account removed on every start.
    fn default_account(&self) -> &'static str;

    /// Template variables for the configuration files.
    fn template_context(&self, config: &ServiceConfig) -> serde_json::Value;
}
