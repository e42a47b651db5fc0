/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument, trace};
use tracing_appender::non_blocking::WorkerGuard;

use crate::common::SwitchyardConfig;
use crate::endpoint::{ComponentId, EndpointDescriptor, EndpointRegistry, QName, RegistryError};
use crate::router::Router;
use crate::store::StoreFactory;
use crate::traits::{ComponentProcessor, Store};

/// Cause recorded on exchanges still in flight when shutdown gives up waiting.
pub const SHUTDOWN_CAUSE: &str = "container shutting down";

/// Grace period for failed exchanges to release their store entries.
const SETTLE_GRACE: Duration = Duration::from_millis(500);

/// A running container, returned by [`Switchyard::launch_async`](crate::common::Switchyard::launch_async).
///
/// Owns the process-wide registry, router and exchange store. Components activate
/// endpoints and connect through it; [`shutdown`](Self::shutdown) drains and tears it
/// down.
pub struct ContainerRuntime {
    registry: Arc<EndpointRegistry>,
    router: Router,
    store: Arc<dyn Store>,
    stores: StoreFactory,
    config: SwitchyardConfig,
    _log_guard: Option<WorkerGuard>,
}

impl ContainerRuntime {
    pub(crate) fn new(
        registry: Arc<EndpointRegistry>,
        router: Router,
        store: Arc<dyn Store>,
        stores: StoreFactory,
        config: SwitchyardConfig,
        log_guard: Option<WorkerGuard>,
    ) -> Self {
        Self {
            registry,
            router,
            store,
            stores,
            config,
            _log_guard: log_guard,
        }
    }

    /// The container's endpoint registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// The router delivering exchanges between connected components.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The store holding in-flight exchanges.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Factory for additional named stores sharing this container's backend.
    #[must_use]
    pub fn stores(&self) -> &StoreFactory {
        &self.stores
    }

    /// Configuration the container was launched with.
    #[must_use]
    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    /// Publishes an endpoint.
    pub fn activate_endpoint(
        &self,
        descriptor: EndpointDescriptor,
    ) -> Result<Arc<EndpointDescriptor>, RegistryError> {
        self.registry.register(descriptor)
    }

    /// Withdraws one endpoint owned by `component_id`.
    pub fn deactivate_endpoint(
        &self,
        component_id: &ComponentId,
        service_name: &QName,
        endpoint_name: &str,
    ) -> Option<Arc<EndpointDescriptor>> {
        self.registry
            .unregister(component_id, service_name, endpoint_name)
    }

    /// Connects a push-style component.
    pub fn connect_component<P: ComponentProcessor>(
        &self,
        component_id: impl Into<ComponentId>,
        processor: P,
    ) {
        self.router.connect_processor(component_id, processor);
    }

    /// Connects a pull-style component.
    pub fn connect_queue(&self, component_id: impl Into<ComponentId>) {
        self.router.connect_queue(component_id);
    }

    /// Disconnects a component and withdraws all of its endpoints. Returns how many
    /// endpoints were withdrawn.
    #[instrument(skip(self))]
    pub fn deactivate_component(&self, component_id: &ComponentId) -> usize {
        self.router.disconnect(component_id);
        let removed = self.registry.unregister_component(component_id);
        debug!(removed, "Component deactivated");
        removed
    }

    /// Shuts the container down.
    ///
    /// New sends are refused at once. In-flight exchanges get up to
    /// `timeouts.shutdown_drain_timeout_ms` to finish; whatever remains is failed with
    /// [`SHUTDOWN_CAUSE`]. Components are then disconnected, pending `accept` calls
    /// return [`RouterError::ShuttingDown`](crate::router::RouterError::ShuttingDown) and
    /// the registry is cleared.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        let drain_timeout = self.config.shutdown_drain_timeout();
        trace!("Refusing new exchanges");
        self.router.begin_shutdown();

        trace!("Waiting for in-flight exchanges to drain...");
        if self.router.drain(drain_timeout).await {
            trace!("All exchanges completed.");
        } else {
            let failed = self.router.fail_in_flight(SHUTDOWN_CAUSE);
            error!(
                "Shutdown drain timeout expired after {:?}; failed {} in-flight exchanges",
                drain_timeout, failed
            );
            if !self.router.drain(SETTLE_GRACE).await {
                error!("{} exchanges did not settle after being failed", self.router.in_flight());
            }
        }

        self.router.stop();
        self.registry.clear();
        trace!("Container shutdown complete.");
        Ok(())
    }
}

impl fmt::Debug for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRuntime")
            .field("registry", &self.registry)
            .field("router", &self.router)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
