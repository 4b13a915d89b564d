//! RabbitMQ service definition.

use super::traits::ServiceDefinition;
use crate::config::ServiceConfig;

/// RabbitMQ message broker.
pub struct RabbitmqService;

impl ServiceDefinition for RabbitmqService {
    fn name(&self) -> &'static str {
        "rabbitmq"
    }

    fn display_name(&self) -> &'static str {
        "RabbitMQ Server"
    }

    fn init_service(&self) -> &'static str {
        "rabbitmq-server"
    }

    fn install_plugins(&self) -> Vec<&'static str> {
        vec!["rabbitmq_management"]
    }

    fn default_account(&self) -> &'static str {
        "guest"
    }

    fn template_context(&self, config: &ServiceConfig) -> serde_json::Value {
        serde_json::json!({
            "node_name": config.node_name,
            "listen_interface": config.listen_interface,
            "port": config.port,
            "management_port": config.management_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig {
            user: "rabbitmq".to_string(),
            group: "rabbitmq".to_string(),
            node_name: "rabbit@node1".to_string(),
            listen_interface: "0.0.0.0".to_string(),
            port: 5672,
            management_port: 15672,
            admin_username: "admin".to_string(),
            admin_password: "secret".to_string(),
        }
    }

    #[test]
    fn test_rabbitmq_service() {
        let service = RabbitmqService;
        assert_eq!(service.name(), "rabbitmq");
        assert_eq!(service.display_name(), "RabbitMQ Server");
        assert_eq!(service.init_service(), "rabbitmq-server");
        assert_eq!(service.install_plugins(), vec!["rabbitmq_management"]);
        assert_eq!(service.default_account(), "guest");
    }

    #[test]
    fn test_template_context_excludes_credentials() {
        let context = RabbitmqService.template_context(&config());
        assert_eq!(context["node_name"], "rabbit@node1");
        assert_eq!(context["port"], 5672);
        assert_eq!(context["management_port"], 15672);
        assert!(context.get("admin_password").is_none());
    }
}
