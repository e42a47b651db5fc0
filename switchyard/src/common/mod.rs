//! Container bootstrap: configuration, logging, launch and the running container.
//!
//! *   [`Switchyard`]: entry point that builds a container from configuration.
//! *   [`ContainerRuntime`]: the running container, owning registry, router and store.
//! *   [`SwitchyardConfig`] and [`CONFIG`]: TOML configuration from XDG locations.
//! *   [`init_logging`]: installs the file-backed tracing subscriber.

pub use config::{
    BehaviorConfig, LimitsConfig, PathsConfig, RoutingConfig, StoreConfig, SwitchyardConfig,
    TimeoutConfig, TracingConfig, CONFIG,
};
pub use logging::init_logging;
pub use runtime::{ContainerRuntime, SHUTDOWN_CAUSE};
pub use switchyard::Switchyard;

/// Defines [`SwitchyardConfig`] and the global [`CONFIG`].
mod config;
mod logging;
/// Defines the [`ContainerRuntime`] returned by launch.
mod runtime;
/// Defines the [`Switchyard`] entry point.
mod switchyard;
