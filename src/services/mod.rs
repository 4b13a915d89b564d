//! Service definitions module.
//!
//! Contains the broker's service definition.

mod rabbitmq;
mod traits;

pub use rabbitmq::RabbitmqService;
pub use traits::ServiceDefinition;
