//! Broker lifecycle operations.
//!
//! The [`LifecycleController`] exposes the five operations the orchestrator
//! invokes. Everything it does goes through a [`crate::platform::Platform`].

mod broker;
mod controller;
mod operation;
mod status;

pub use controller::LifecycleController;
pub use operation::Operation;
pub use status::classify_service_check;
