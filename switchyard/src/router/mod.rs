//! Routing: endpoint resolution, delivery to components and ownership hand-off.

pub use router::{Router, RouterBuilder};
pub use router_error::RouterError;
pub use strategy::RoutingStrategy;

#[allow(clippy::module_inception)]
mod router;
mod router_error;
mod strategy;
