//! Contracts the container core consumes.
//!
//! *   [`Store`]: keyed persistence used for in-flight exchange state. Backends advertise
//!     their guarantees through [`StoreFeature`] flags; callers branch on those flags, never
//!     on the concrete backend.
//! *   [`StoreExt`]: typed convenience methods over any [`Store`].
//! *   [`ComponentProcessor`]: the push-delivery callback a component connects to the
//!     [`Router`](crate::router::Router).

pub use component_processor::{processor_fn, ComponentProcessor, FnProcessor};
pub use store::{Store, StoreExt, StoreFeature, CLUSTERED, PERSISTENT, TRANSACTIONAL};

/// Defines the [`ComponentProcessor`] trait and its closure adapter.
mod component_processor;
/// Defines the [`Store`] trait and feature flags.
mod store;
