//! Routing and failover across registered providers.

mod routing_model;
mod routing_service;

pub use routing_model::{select_provider, RoutingDecision, RoutingReason};
pub use routing_service::RoutingService;
