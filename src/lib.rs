//! RabbitMQ lifecycle library.
//!
//! Installs, configures, starts, stops and health-checks a RabbitMQ broker
//! on a managed host, on behalf of a cluster orchestrator. All work is done
//! by driving the package manager, the init system and the broker CLIs.

pub mod audit;
pub mod config;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod platform;
pub mod services;
pub mod templates;
