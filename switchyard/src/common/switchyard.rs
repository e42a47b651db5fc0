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

use std::sync::Arc;

use tracing::{debug, trace};

use crate::common::{init_logging, ContainerRuntime, SwitchyardConfig};
use crate::endpoint::EndpointRegistry;
use crate::router::Router;
use crate::store::StoreFactory;

/// Entry point for starting a container.
///
/// ```rust,ignore
/// use switchyard::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut runtime = Switchyard::launch_async().await?;
///     // Register endpoints, connect components, send exchanges...
///     runtime.shutdown().await
/// }
/// ```
#[derive(Default, Debug, Clone)]
pub struct Switchyard;

impl Switchyard {
    /// Starts a container configured from the XDG configuration file.
    pub async fn launch_async() -> anyhow::Result<ContainerRuntime> {
        Self::launch_with(SwitchyardConfig::load()).await
    }

    /// Starts a container with an explicit configuration.
    ///
    /// Opens the exchange store named by `store.name`, builds the registry and router,
    /// and installs file logging when `behavior.enable_tracing` is set.
    pub async fn launch_with(config: SwitchyardConfig) -> anyhow::Result<ContainerRuntime> {
        let log_guard = if config.behavior.enable_tracing {
            init_logging(&config)
        } else {
            None
        };
        trace!("Starting Switchyard container");
        trace!("Configuration: {:?}", config);

        let stores = StoreFactory::from_config(&config);
        let store = stores.open(&config.store.name).await?;
        let registry = Arc::new(EndpointRegistry::new());
        let router = Router::builder(Arc::clone(&registry))
            .with_config(&config)
            .store(Arc::clone(&store))
            .build();

        debug!(store = store.name(), strategy = %router.strategy(), "Switchyard container started");
        Ok(ContainerRuntime::new(
            registry, router, store, stores, config, log_guard,
        ))
    }
}
